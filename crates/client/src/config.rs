//! Client-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen (Pfad aus `FLUESTER_CLIENT_CONFIG`).
//! Alle Felder haben Standardwerte, eine fehlende Datei ist kein Fehler.

use fluester_core::grenzen::{MAX_DATEIEN_PRO_SENDUNG, MAX_NUTZLAST_BYTES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backoff::ReconnectPolicy;
use crate::error::{ClientError, ClientResult};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Herkunft des Relays, z.B. `http://localhost:3000`
    pub origin: String,
    /// Wiederverbindungs-Einstellungen
    pub reconnect: ReconnectEinstellungen,
    /// Ausgehende Warteschlange
    pub queue: QueueEinstellungen,
    /// Datei-Versand
    pub dateien: DateiEinstellungen,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".into(),
            reconnect: ReconnectEinstellungen::default(),
            queue: QueueEinstellungen::default(),
            dateien: DateiEinstellungen::default(),
        }
    }
}

/// Wiederverbindungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectEinstellungen {
    /// Maximale Anzahl Versuche nach einem unerwarteten Abbruch
    pub max_versuche: u32,
    /// Verzoegerung vor dem ersten Versuch, verdoppelt sich pro Versuch
    pub basis_verzoegerung_ms: u64,
}

impl Default for ReconnectEinstellungen {
    fn default() -> Self {
        Self {
            max_versuche: 5,
            basis_verzoegerung_ms: 2000,
        }
    }
}

/// Ausgehende Warteschlange
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueEinstellungen {
    /// Maximale Anzahl wartender Nachrichten (aelteste wird verdraengt)
    pub kapazitaet: usize,
}

impl Default for QueueEinstellungen {
    fn default() -> Self {
        Self { kapazitaet: 50 }
    }
}

/// Datei-Versand
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateiEinstellungen {
    /// Maximale Dateigroesse in Bytes
    pub max_groesse: u64,
    /// Maximale Anzahl Dateien pro Sendung
    pub max_anzahl: usize,
}

impl Default for DateiEinstellungen {
    fn default() -> Self {
        Self {
            max_groesse: MAX_NUTZLAST_BYTES as u64,
            max_anzahl: MAX_DATEIEN_PRO_SENDUNG,
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    /// Laeuft vor dem Logging-Setup, daher meldet der Aufrufer die fehlende
    /// Datei.
    pub fn laden(pfad: &str) -> ClientResult<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| ClientError::Konfiguration(format!("'{pfad}': {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ClientError::Konfiguration(format!(
                "'{pfad}' nicht lesbar: {e}"
            ))),
        }
    }

    /// Wiederverbindungs-Strategie aus den Einstellungen
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::neu(
            self.reconnect.max_versuche,
            Duration::from_millis(self.reconnect.basis_verzoegerung_ms),
        )
    }
}
