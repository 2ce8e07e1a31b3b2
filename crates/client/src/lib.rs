//! fluester-client – Kanal, Pipeline und Umgebung des Chat-Clients
//!
//! ## Architektur
//!
//! ```text
//! MessagePipeline  (Text / Sprache / Dateien -> verschluesseln -> senden)
//!     |
//!     v
//! Channel          (Treiber-Task: Verbindung, Wiederverbindung, Warteschlange)
//!     |  ChannelEvent ueber broadcast-Bus
//!     v
//! Presentation / NotificationSink
//! ```
//!
//! ## Sicherheitsmodell
//! Alle Teilnehmer teilen einen symmetrischen Schluessel, der ausserhalb
//! des Relays verteilt wird (`FLUESTER_KEY`). Das schuetzt Inhalte vor dem
//! Relay und vor Mitlesern im Netz, nicht aber vor anderen
//! Schluesselinhabern: wer den Schluessel hat, liest alles und kann sich
//! inhaltlich als jeder andere ausgeben. Die Absender-ID setzt allein das
//! Relay.

pub mod backoff;
pub mod channel;
pub mod collaborators;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod files;
pub mod pipeline;
pub mod queue;
pub mod transport;
pub mod voice;

// Bequeme Re-Exporte
pub use backoff::ReconnectPolicy;
pub use channel::{Channel, GeteilteCipherBox, Phase};
pub use collaborators::{
    DateiKandidat, DateiKategorie, FileClassifier, NotificationSink, Presentation,
    TracingHinweise, Validierung,
};
pub use config::ClientConfig;
pub use endpoint::websocket_url;
pub use error::{ClientError, ClientResult};
pub use events::ChannelEvent;
pub use files::{format_file_size, MimeClassifier};
pub use pipeline::MessagePipeline;
pub use queue::OutboundQueue;
pub use voice::{Aufnahme, VoiceRecorder};
