//! Relay-Zustand und Weiterleitungslogik
//!
//! Das Relay vergibt Anzeige-IDs, stempelt eingehende Frames mit Absender
//! und Zeit und verteilt sie an alle anderen Peers. Inhalte bleiben
//! verschluesselt; das Relay prueft nur Groesse und Objektform.

use fluester_core::jetzt_ms;
use fluester_observability::PeerZaehler;
use fluester_protocol::{kodieren, stempeln, WireMessage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use crate::config::RelayConfig;
use crate::error::RelayResult;
use crate::registry::{PeerRegistry, PeerSession};

/// Gemeinsamer Relay-Zustand (Arc-geteilt zwischen Verbindungs-Tasks)
pub struct Relay {
    config: RelayConfig,
    registry: PeerRegistry,
    /// Naechste Gast-Nummer, beginnt bei 1
    gast_zaehler: AtomicU64,
    /// Serialisiert Beitritt/Austritt samt Anzahl-Broadcast, damit die
    /// gemeldeten Zaehlerstaende bei allen Peers in derselben Reihenfolge
    /// ankommen
    mitglieder: Mutex<()>,
}

impl Relay {
    pub fn neu(config: RelayConfig) -> Self {
        Self {
            config,
            registry: PeerRegistry::neu(),
            gast_zaehler: AtomicU64::new(1),
            mitglieder: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn peer_anzahl(&self) -> usize {
        self.registry.peer_anzahl()
    }

    /// Nimmt einen neuen Peer auf
    ///
    /// Vergibt die naechste Gast-ID, schickt sie nur an den neuen Peer und
    /// meldet danach allen die neue Peer-Anzahl.
    pub fn peer_verbinden(&self) -> (PeerSession, mpsc::Receiver<String>) {
        let _guard = self.mitglieder.lock();

        let nummer = self.gast_zaehler.fetch_add(1, Ordering::Relaxed);
        let session = PeerSession::neu(format!("{}{}", self.config.gast_praefix, nummer));
        let rx = self
            .registry
            .registrieren(session.clone(), self.config.send_queue);

        self.an_peer(
            &session,
            &WireMessage::UserId {
                user_id: session.display_id.clone(),
            },
        );
        let anzahl = self.anzahl_melden();

        tracing::info!(
            peer = %session.display_id,
            verbindung = %session.connection_id,
            peers = anzahl,
            "Peer verbunden"
        );
        (session, rx)
    }

    /// Entfernt einen Peer und meldet die neue Peer-Anzahl
    pub fn peer_trennen(&self, session: &PeerSession) {
        let _guard = self.mitglieder.lock();

        if self.registry.entfernen(&session.connection_id).is_none() {
            return;
        }
        let anzahl = self.anzahl_melden();

        tracing::info!(
            peer = %session.display_id,
            dauer_sek = (chrono::Utc::now() - session.connected_at).num_seconds(),
            peers = anzahl,
            "Peer getrennt"
        );
    }

    /// Verarbeitet einen eingehenden Frame eines Peers
    ///
    /// Ungueltige oder zu grosse Frames werden ohne Antwort verworfen.
    /// Gibt die Anzahl der Empfaenger zurueck.
    pub fn eingehend_verarbeiten(&self, absender: &PeerSession, roh: &str) -> usize {
        match self.stempeln_fuer(absender, roh) {
            Ok(gestempelt) => {
                let empfaenger = self
                    .registry
                    .an_alle_ausser_senden(&absender.connection_id, &gestempelt);
                tracing::trace!(
                    peer = %absender.display_id,
                    bytes = roh.len(),
                    empfaenger,
                    "Nachricht weitergeleitet"
                );
                empfaenger
            }
            Err(e) => {
                tracing::warn!(
                    peer = %absender.display_id,
                    bytes = roh.len(),
                    fehler = %e,
                    "Nachricht verworfen"
                );
                0
            }
        }
    }

    fn stempeln_fuer(&self, absender: &PeerSession, roh: &str) -> RelayResult<String> {
        Ok(stempeln(
            roh,
            self.config.max_nutzlast,
            &absender.display_id,
            jetzt_ms(),
        )?)
    }

    fn an_peer(&self, session: &PeerSession, nachricht: &WireMessage) {
        match kodieren(nachricht) {
            Ok(text) => {
                self.registry.an_peer_senden(&session.connection_id, text);
            }
            Err(e) => tracing::error!(fehler = %e, "Kodieren fehlgeschlagen"),
        }
    }

    fn anzahl_melden(&self) -> usize {
        let anzahl = self.registry.peer_anzahl();
        match kodieren(&WireMessage::UserCount {
            count: anzahl as u64,
        }) {
            Ok(text) => {
                self.registry.an_alle_senden(&text);
            }
            Err(e) => tracing::error!(fehler = %e, "Kodieren fehlgeschlagen"),
        }
        anzahl
    }
}

impl PeerZaehler for Relay {
    fn peer_anzahl(&self) -> usize {
        self.registry.peer_anzahl()
    }
}
