//! Typisierte Ereignisse des Kanals
//!
//! Ereignisse werden ueber einen `tokio::sync::broadcast`-Bus verteilt.
//! Jeder Abonnent erhaelt alle Ereignisse ab dem Zeitpunkt des Abonnements.

use fluester_core::Schweregrad;
use fluester_protocol::{DateiNachricht, SprachNachricht, TextNachricht};
use std::time::Duration;

/// Kapazitaet des Ereignis-Busses pro Abonnent
pub const EVENT_BUS_KAPAZITAET: usize = 256;

/// Ereignis des Kanals
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Verbindung offen
    Connected,
    /// Verbindung beendet, mit Close-Code (1006 wenn abgerissen)
    Disconnected { code: u16 },
    /// Vom Relay zugewiesene Anzeige-ID
    UserId(String),
    /// Anzahl verbundener Peers
    UserCount(u64),
    /// Textnachricht, `content` bereits entschluesselt
    Message(TextNachricht),
    /// Sprachnachricht, `content` noch serialisiert und verschluesselt
    VoiceMessage(SprachNachricht),
    /// Dateinachricht, `content` noch serialisiert und verschluesselt
    FileMessage(DateiNachricht),
    /// Transportfehler
    Error(String),
    /// Hinweis fuer den Benutzer
    Notice { text: String, schweregrad: Schweregrad },
    /// Nachricht wartet in der Warteschlange
    Queued { wartend: usize },
    /// Naechster Verbindungsversuch geplant
    ReconnectScheduled { versuch: u32, verzoegerung: Duration },
    /// Keine weiteren Versuche, der Kanal bleibt getrennt
    ReconnectExhausted,
}

impl ChannelEvent {
    pub fn hinweis(text: impl Into<String>, schweregrad: Schweregrad) -> Self {
        Self::Notice {
            text: text.into(),
            schweregrad,
        }
    }
}
