//! Fehlertypen fuer den Client

use fluester_crypto::CryptoError;
use fluester_protocol::ProtocolError;
use thiserror::Error;

/// Fehlertyp fuer den Client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Kein Schluessel geladen oder generiert
    #[error("Kein Schluessel verfuegbar")]
    NichtBereit,

    /// Ver- oder Entschluesselung fehlgeschlagen
    #[error("Kryptografiefehler: {0}")]
    Krypto(CryptoError),

    /// Verbindungsaufbau oder Socket-Fehler
    #[error("Transportfehler: {0}")]
    Transport(String),

    /// Alle Wiederverbindungsversuche aufgebraucht
    #[error("Wiederverbindung nach {versuche} Versuchen aufgegeben")]
    WiederverbindungErschoepft { versuche: u32 },

    /// Inhalt ueberschreitet die Groessengrenze
    #[error("Nutzlast zu gross: {groesse} Bytes (max {max})")]
    NutzlastZuGross { groesse: u64, max: u64 },

    /// Eingehender oder ausgehender Frame nicht verwertbar
    #[error("Ungueltige Nutzlast: {0}")]
    UngueltigeNutzlast(#[from] ProtocolError),

    /// Audio-Aufnahme im falschen Zustand
    #[error("Aufnahmefehler: {0}")]
    Aufnahme(String),

    /// Konfigurationsdatei fehlerhaft
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    /// IO-Fehler (Dateien, stdin)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::NichtBereit => Self::NichtBereit,
            andere => Self::Krypto(andere),
        }
    }
}

impl ClientError {
    /// Erstellt einen Transportfehler
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Result-Typ fuer den Client
pub type ClientResult<T> = Result<T, ClientError>;
