//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. `PORT` und `HOST` aus der Umgebung haben Vorrang.

use fluester_observability::{log_format_gueltig, log_level_gueltig};
use fluester_relay::RelayConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Relay-Einstellungen (Nutzlastgrenze, Send-Queue, Gast-Praefix)
    pub relay: RelayConfig,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    /// Laeuft vor dem Logging-Setup, daher meldet der Aufrufer die fehlende
    /// Datei.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.ueberschreiben(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("HOST").ok().as_deref(),
        )?;
        config.pruefen()?;
        Ok(config)
    }

    /// Prueft Werte, die serde nicht einschraenkt
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!(
                "logging.level '{}' ungueltig (trace, debug, info, warn, error)",
                self.logging.level
            );
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!(
                "logging.format '{}' ungueltig (text, json)",
                self.logging.format
            );
        }
        if self.relay.max_nutzlast == 0 || self.relay.send_queue == 0 {
            anyhow::bail!("relay.max_nutzlast und relay.send_queue muessen groesser 0 sein");
        }
        Ok(())
    }

    /// Uebernimmt Port und Host aus der Umgebung
    pub fn ueberschreiben(&mut self, port: Option<&str>, host: Option<&str>) -> anyhow::Result<()> {
        if let Some(port) = port {
            self.netzwerk.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT '{port}' ungueltig: {e}"))?;
        }
        if let Some(host) = host.map(str::trim).filter(|h| !h.is_empty()) {
            self.netzwerk.bind_adresse = host.to_string();
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    ///
    /// IPv6-Adressen werden in eckige Klammern gesetzt.
    pub fn bind_adresse(&self) -> String {
        let host = &self.netzwerk.bind_adresse;
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.netzwerk.port)
        } else {
            format!("{host}:{}", self.netzwerk.port)
        }
    }
}
