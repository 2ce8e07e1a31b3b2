//! Peer-Registry – Send-Queues aller verbundenen Peers
//!
//! Die Registry haelt pro Verbindung eine begrenzte Send-Queue. Senden ist
//! immer nicht-blockierend: volle oder geschlossene Queues werden
//! uebersprungen, nie abgewartet.
//!
//! ## Selektives Senden
//! - An einen Peer: `an_peer_senden`
//! - An alle Peers: `an_alle_senden`
//! - An alle ausser einen: `an_alle_ausser_senden`

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fluester_core::ConnectionId;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// PeerSession
// ---------------------------------------------------------------------------

/// Eine verbundene Gegenstelle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSession {
    pub connection_id: ConnectionId,
    /// Vom Relay vergebene Anzeige-ID, z.B. `Guest3`
    pub display_id: String,
    pub connected_at: DateTime<Utc>,
}

impl PeerSession {
    pub fn neu(display_id: impl Into<String>) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            display_id: display_id.into(),
            connected_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// PeerSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Peers
#[derive(Clone, Debug)]
pub struct PeerSender {
    pub session: PeerSession,
    pub tx: mpsc::Sender<String>,
}

impl PeerSender {
    /// Reiht einen Textframe nicht-blockierend ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, text: String) -> bool {
        match self.tx.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(peer = %self.session.display_id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(peer = %self.session.display_id, "Send-Queue geschlossen (Peer getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PeerRegistry
// ---------------------------------------------------------------------------

/// Alle verbundenen Peers, indiziert nach Verbindung
///
/// Broadcast iteriert ueber alle Eintraege (O(Peers) pro Nachricht).
#[derive(Default)]
pub struct PeerRegistry {
    peers: DashMap<ConnectionId, PeerSender>,
}

impl PeerRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Peer und gibt seine Empfangs-Queue zurueck
    ///
    /// Die Verbindung liest aus dieser Queue und schreibt in den Socket.
    pub fn registrieren(
        &self,
        session: PeerSession,
        queue_groesse: usize,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(queue_groesse.max(1));
        let id = session.connection_id;
        self.peers.insert(id, PeerSender { session, tx });
        tracing::debug!(verbindung = %id, "Peer in Registry registriert");
        rx
    }

    /// Entfernt einen Peer, seine Send-Queue wird damit geschlossen
    pub fn entfernen(&self, id: &ConnectionId) -> Option<PeerSession> {
        self.peers.remove(id).map(|(_, sender)| sender.session)
    }

    /// Sendet an einen einzelnen Peer
    pub fn an_peer_senden(&self, id: &ConnectionId, text: String) -> bool {
        match self.peers.get(id) {
            Some(sender) => sender.senden(text),
            None => {
                tracing::debug!(verbindung = %id, "Senden an unbekannten Peer");
                false
            }
        }
    }

    /// Sendet an alle Peers
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, text: &str) -> usize {
        self.peers
            .iter()
            .filter(|entry| entry.value().senden(text.to_string()))
            .count()
    }

    /// Sendet an alle Peers ausser dem Absender
    pub fn an_alle_ausser_senden(&self, ausgeschlossen: &ConnectionId, text: &str) -> usize {
        self.peers
            .iter()
            .filter(|entry| entry.key() != ausgeschlossen)
            .filter(|entry| entry.value().senden(text.to_string()))
            .count()
    }

    pub fn peer_anzahl(&self) -> usize {
        self.peers.len()
    }

    pub fn ist_registriert(&self, id: &ConnectionId) -> bool {
        self.peers.contains_key(id)
    }
}
