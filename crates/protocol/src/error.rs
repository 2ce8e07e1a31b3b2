//! Fehlertypen fuer das Wire-Protokoll

use thiserror::Error;

/// Fehler beim Kodieren, Dekodieren oder Stempeln eines Frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame ueberschreitet die Groessengrenze
    #[error("Nutzlast zu gross: {groesse} Bytes (Maximum: {max} Bytes)")]
    NutzlastZuGross { groesse: usize, max: usize },

    /// Frame ist kein JSON-Objekt
    #[error("Nutzlast ist kein JSON-Objekt")]
    KeinObjekt,

    /// Unbekannter Wert im Feld `type`
    #[error("Unbekannter Nachrichtentyp: {0}")]
    UnbekannterTyp(String),

    /// JSON-Fehler (Syntax oder Feldstruktur)
    #[error("Ungueltiges JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
