//! fluester-server – Bibliotheks-Root
//!
//! Verbindet Konfiguration, Relay und Shutdown-Signal.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use fluester_relay::RelayServer;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bindet die konfigurierte Adresse und laeuft bis Ctrl-C
    ///
    /// Offene WebSockets werden beim Shutdown mit Code 1001 geschlossen.
    pub async fn starten(self) -> Result<()> {
        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Adresse '{adresse}' nicht bindbar"))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    tracing::error!(fehler = %e, "Ctrl-C-Handler nicht installierbar");
                    // Sender am Leben halten, sonst endet der Server sofort
                    std::future::pending::<()>().await;
                    drop(shutdown_tx);
                }
            }
        });

        self.auf_listener(listener, shutdown_rx).await
    }

    /// Bedient einen bereits gebundenen Listener bis `shutdown_rx` `true` meldet
    pub async fn auf_listener(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<()> {
        tracing::info!(
            max_nutzlast = self.config.relay.max_nutzlast,
            send_queue = self.config.relay.send_queue,
            "Server startet"
        );

        RelayServer::neu(self.config.relay)
            .starten(listener, shutdown_rx)
            .await
            .context("Relay beendet mit Fehler")
    }
}
