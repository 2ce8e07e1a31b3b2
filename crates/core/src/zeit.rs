//! Zeitstempel im Wire-Format (Unix-Millisekunden)

use chrono::Utc;

/// Aktuelle Zeit in Millisekunden seit der Unix-Epoche
pub fn jetzt_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
