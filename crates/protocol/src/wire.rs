//! Nachrichtentypen des Wire-Protokolls
//!
//! ## Design
//! - Internally tagged Enum (`type`-Feld) fuer typsichere Varianten
//! - Feldnamen im Wire-Format in camelCase
//! - `userId` und `timestamp` setzt ausschliesslich das Relay; Clients
//!   lassen sie beim Senden weg

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Nachrichten-Nutzlasten
// ---------------------------------------------------------------------------

/// Verschluesselte Textnachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNachricht {
    /// Serialisierter Umschlag (base64 von nonce || ciphertext)
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Unix-Millisekunden, vom Relay gesetzt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Verschluesselte Sprachnachricht
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprachNachricht {
    pub content: String,
    /// Dauer in Sekunden
    #[serde(default)]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Verschluesselte Datei mit Metadaten im Klartext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateiNachricht {
    pub content: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

// ---------------------------------------------------------------------------
// WireMessage
// ---------------------------------------------------------------------------

/// Ein einzelner JSON-Textframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Zugewiesene Anzeige-ID (nur an den neuen Peer)
    UserId {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Aktuelle Anzahl verbundener Peers
    UserCount { count: u64 },
    TextMessage(TextNachricht),
    VoiceMessage(SprachNachricht),
    FileMessage(DateiNachricht),
}

/// Art einer Chat-Nachricht (ohne Verwaltungsnachrichten)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NachrichtenArt {
    Text,
    Sprache,
    Datei,
}

impl WireMessage {
    /// Alle bekannten Werte des `type`-Felds
    pub const TYPEN: [&'static str; 5] = [
        "user_id",
        "user_count",
        "text_message",
        "voice_message",
        "file_message",
    ];

    /// Erstellt eine ausgehende Textnachricht
    pub fn text(content: impl Into<String>) -> Self {
        Self::TextMessage(TextNachricht {
            content: content.into(),
            user_id: None,
            timestamp: None,
        })
    }

    /// Erstellt eine ausgehende Sprachnachricht
    pub fn sprache(content: impl Into<String>, duration: f64) -> Self {
        Self::VoiceMessage(SprachNachricht {
            content: content.into(),
            duration,
            user_id: None,
            timestamp: None,
        })
    }

    /// Erstellt eine ausgehende Dateinachricht
    pub fn datei(
        content: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self::FileMessage(DateiNachricht {
            content: content.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            file_size,
            user_id: None,
            timestamp: None,
        })
    }

    /// Wert des `type`-Felds dieser Variante
    pub fn typ(&self) -> &'static str {
        match self {
            Self::UserId { .. } => "user_id",
            Self::UserCount { .. } => "user_count",
            Self::TextMessage(_) => "text_message",
            Self::VoiceMessage(_) => "voice_message",
            Self::FileMessage(_) => "file_message",
        }
    }

    /// Art der Chat-Nachricht, `None` fuer Verwaltungsnachrichten
    pub fn art(&self) -> Option<NachrichtenArt> {
        match self {
            Self::TextMessage(_) => Some(NachrichtenArt::Text),
            Self::VoiceMessage(_) => Some(NachrichtenArt::Sprache),
            Self::FileMessage(_) => Some(NachrichtenArt::Datei),
            _ => None,
        }
    }

    /// Vom Relay gestempelte Absender-ID
    pub fn absender(&self) -> Option<&str> {
        match self {
            Self::TextMessage(n) => n.user_id.as_deref(),
            Self::VoiceMessage(n) => n.user_id.as_deref(),
            Self::FileMessage(n) => n.user_id.as_deref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
