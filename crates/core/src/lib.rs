//! fluester-core – Gemeinsame Typen und Grenzwerte
//!
//! Dieses Crate stellt die Bausteine bereit, die Relay und Client
//! gemeinsam nutzen: Verbindungs-IDs, Schweregrade fuer Hinweise,
//! systemweite Grenzwerte und den Zeitstempel im Wire-Format.

pub mod grenzen;
pub mod types;
pub mod zeit;

// Re-Exporte fuer bequemen Zugriff
pub use grenzen::MAX_NUTZLAST_BYTES;
pub use types::{ConnectionId, Schweregrad};
pub use zeit::jetzt_ms;
