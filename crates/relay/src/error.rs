//! Fehlertypen fuer das Relay

use fluester_protocol::ProtocolError;
use thiserror::Error;

/// Fehlertyp fuer das Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// IO-Fehler (Bind, Accept)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Eingehender Frame verletzt Groesse oder Format
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),
}

/// Result-Typ fuer das Relay
pub type RelayResult<T> = Result<T, RelayError>;
