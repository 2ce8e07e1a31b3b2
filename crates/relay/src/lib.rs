//! fluester-relay – WebSocket-Relay fuer verschluesselte Chat-Nachrichten
//!
//! Das Relay sieht nur Umschlaege. Es vergibt Anzeige-IDs, stempelt
//! Absender und Zeit in jeden Frame und verteilt ihn an alle anderen
//! verbundenen Peers.
//!
//! ## Architektur
//!
//! ```text
//! RelayServer (axum, GET / + GET /health)
//!     |
//!     v
//! connection::verarbeiten (pro WebSocket ein Task)
//!     |
//!     v
//! Relay  – Gast-IDs, Stempel, Groessenpruefung
//!     |
//!     v
//! PeerRegistry – Send-Queues aller Peers (try_send, nie blockierend)
//! ```
//!
//! Jede Nachricht wird an alle Peers einzeln eingereiht; die Kosten pro
//! Nachricht wachsen linear mit der Peer-Anzahl.

pub mod config;
pub mod connection;
pub mod error;
pub mod registry;
pub mod relay;
pub mod server;

// Bequeme Re-Exporte
pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use registry::{PeerRegistry, PeerSession};
pub use relay::Relay;
pub use server::RelayServer;
