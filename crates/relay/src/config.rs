//! Relay-Konfiguration

use fluester_core::MAX_NUTZLAST_BYTES;
use serde::{Deserialize, Serialize};

/// Konfiguration des Relays
///
/// Wird als `[relay]`-Abschnitt der Server-Konfiguration gelesen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Maximale Groesse eines eingehenden Frames in Bytes
    pub max_nutzlast: usize,
    /// Groesse der Send-Queue pro Peer
    pub send_queue: usize,
    /// Praefix fuer vergebene Anzeige-IDs
    pub gast_praefix: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_nutzlast: MAX_NUTZLAST_BYTES,
            send_queue: 256,
            gast_praefix: "Guest".to_string(),
        }
    }
}

impl RelayConfig {
    /// Grenze fuer die WebSocket-Schicht
    ///
    /// Liegt deutlich ueber `max_nutzlast`, damit zu grosse Frames bis zur
    /// Anwendung durchkommen und dort still verworfen werden, statt die
    /// Verbindung zu beenden.
    pub fn transport_limit(&self) -> usize {
        self.max_nutzlast.saturating_mul(4)
    }
}
