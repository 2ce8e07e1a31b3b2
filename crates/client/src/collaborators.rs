//! Schnittstellen zur Umgebung des Clients
//!
//! Darstellung, Dateipruefung und Benutzerhinweise sind Traits, damit die
//! Pipeline ohne konkrete Oberflaeche getestet und eingebettet werden kann.

use fluester_core::Schweregrad;
use fluester_protocol::{NachrichtenArt, WireMessage};

use crate::events::ChannelEvent;

/// Eine zum Versand ausgewaehlte Datei
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateiKandidat {
    pub name: String,
    pub mime_typ: String,
    pub inhalt: Vec<u8>,
}

impl DateiKandidat {
    pub fn neu(name: impl Into<String>, mime_typ: impl Into<String>, inhalt: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_typ: mime_typ.into(),
            inhalt,
        }
    }

    pub fn groesse(&self) -> u64 {
        self.inhalt.len() as u64
    }
}

/// Ergebnis einer Dateipruefung
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validierung {
    pub fehler: Vec<String>,
}

impl Validierung {
    pub fn ist_gueltig(&self) -> bool {
        self.fehler.is_empty()
    }
}

/// Kategorie eines MIME-Typs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateiKategorie {
    Bilder,
    Dokumente,
    Archive,
    Audio,
    Video,
    Unbekannt,
}

/// Prueft Dateien vor dem Versand
pub trait FileClassifier: Send + Sync {
    fn validate(&self, datei: &DateiKandidat) -> Validierung;

    fn category(&self, mime_typ: &str) -> DateiKategorie;

    /// Behaelt hoechstens so viele Dateien wie pro Sendung erlaubt
    fn limit_files(&self, dateien: Vec<DateiKandidat>) -> Vec<DateiKandidat>;
}

/// Nimmt Hinweise fuer den Benutzer entgegen
pub trait NotificationSink: Send + Sync {
    fn notify(&self, text: &str, schweregrad: Schweregrad);
}

/// Stellt empfangene Nachrichten dar
pub trait Presentation: Send + Sync {
    /// Text-, Sprach- oder Dateinachricht; Textinhalt ist bereits
    /// entschluesselt
    fn render_message(&self, art: NachrichtenArt, nachricht: &WireMessage);

    /// Status-Ereignisse (Verbindung, eigene ID, Peer-Anzahl)
    fn ereignis(&self, _ereignis: &ChannelEvent) {}
}

/// Hinweise als Log-Eintraege
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHinweise;

impl NotificationSink for TracingHinweise {
    fn notify(&self, text: &str, schweregrad: Schweregrad) {
        match schweregrad {
            Schweregrad::Error => tracing::error!(hinweis = text),
            Schweregrad::Warning => tracing::warn!(hinweis = text),
            Schweregrad::Success | Schweregrad::Info => tracing::info!(hinweis = text),
        }
    }
}
