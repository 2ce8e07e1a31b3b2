//! # fluester-observability
//!
//! Observability-Crate fuer Fluester:
//! - Health-Check-Endpunkt (`/health`) mit Peer-Anzahl
//! - Structured Logging (Text oder JSON) via tracing-subscriber

pub mod health;
pub mod logging;

pub use health::{health_router, HealthResponse, HealthState, HealthStatus, PeerZaehler};
pub use logging::{log_format_gueltig, log_level_gueltig, logging_initialisieren};
