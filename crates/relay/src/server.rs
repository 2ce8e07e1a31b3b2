//! HTTP/WebSocket-Server des Relays
//!
//! ## Endpunkte
//! - `GET /` – WebSocket-Upgrade, ein Peer pro Verbindung
//! - `GET /health` – Health-Check JSON

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
    routing::get,
    Router,
};
use fluester_observability::{health_router, HealthState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::RelayConfig;
use crate::connection;
use crate::error::RelayResult;
use crate::relay::Relay;

/// Zustand fuer den WebSocket-Handler
#[derive(Clone)]
struct AppState {
    relay: Arc<Relay>,
    shutdown_rx: watch::Receiver<bool>,
}

/// WebSocket-Relay-Server
///
/// Frames ueber `max_nutzlast` verwirft das Relay still. Die
/// WebSocket-Schicht nimmt bis `transport_limit()` (4x `max_nutzlast`)
/// an; bei noch groesseren Frames beendet die WebSocket-Schicht die
/// Verbindung, statt den Frame still zu verwerfen.
pub struct RelayServer {
    relay: Arc<Relay>,
    health: HealthState,
}

impl RelayServer {
    /// Erstellt einen neuen RelayServer
    pub fn neu(config: RelayConfig) -> Self {
        let relay = Arc::new(Relay::neu(config));
        let health = HealthState::neu(relay.clone());
        Self { relay, health }
    }

    /// Geteilter Relay-Zustand
    pub fn relay(&self) -> Arc<Relay> {
        Arc::clone(&self.relay)
    }

    /// Baut den Router mit WebSocket- und Health-Endpunkt
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        let state = AppState {
            relay: self.relay(),
            shutdown_rx,
        };

        Router::new()
            .route("/", get(ws_handler))
            .with_state(state)
            .merge(health_router(self.health.clone()))
    }

    /// Bedient Verbindungen auf einem bereits gebundenen Listener
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt. Offene
    /// WebSockets werden dann mit Code 1001 geschlossen.
    pub async fn starten(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> RelayResult<()> {
        let lokale_addr = listener.local_addr()?;
        tracing::info!(adresse = %lokale_addr, "Relay gestartet");

        let app = self.router(shutdown_rx.clone());
        let health = self.health.clone();
        let mut signal_rx = shutdown_rx;

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = signal_rx.wait_for(|stop| *stop).await;
            health.herunterfahren_melden();
            tracing::info!("Relay: Shutdown-Signal empfangen");
        })
        .await?;

        tracing::info!("Relay gestoppt");
        Ok(())
    }

    /// Bindet `bind_addr` und startet den Server
    pub async fn binden_und_starten(
        self,
        bind_addr: SocketAddr,
        shutdown_rx: watch::Receiver<bool>,
    ) -> RelayResult<()> {
        let listener = TcpListener::bind(bind_addr).await?;
        self.starten(listener, shutdown_rx).await
    }
}

/// `GET /` – WebSocket-Upgrade
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let limit = state.relay.config().transport_limit();
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| {
            connection::verarbeiten(state.relay, socket, peer_addr, state.shutdown_rx)
        })
}
