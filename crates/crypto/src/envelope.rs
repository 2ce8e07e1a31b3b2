//! Umschlag-Format
//!
//! ## Format
//! ```text
//! base64( [nonce(12)] [ciphertext + auth_tag(16)] )
//! ```
//!
//! Standard-Base64-Alphabet mit Padding. Die ersten 12 dekodierten Bytes
//! sind immer die Nonce, der Rest der Ciphertext.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CryptoResult;
use crate::types::{Envelope, NONCE_LAENGE};

/// Serialisiert einen Umschlag als Base64-Text
pub fn serialisieren(envelope: &Envelope) -> String {
    let mut kombiniert = Vec::with_capacity(envelope.nonce.len() + envelope.ciphertext.len());
    kombiniert.extend_from_slice(&envelope.nonce);
    kombiniert.extend_from_slice(&envelope.ciphertext);
    STANDARD.encode(kombiniert)
}

/// Zerlegt Base64-Text in Nonce und Ciphertext
///
/// Ist der dekodierte Inhalt kuerzer als 12 Bytes, landet alles in der
/// Nonce und der Ciphertext bleibt leer. Eine spaetere Entschluesselung
/// schlaegt dann fehl, statt hier zu paniken.
pub fn deserialisieren(text: &str) -> CryptoResult<Envelope> {
    let mut bytes = STANDARD.decode(text.trim())?;
    let schnitt = bytes.len().min(NONCE_LAENGE);
    let ciphertext = bytes.split_off(schnitt);

    Ok(Envelope {
        nonce: bytes,
        ciphertext,
    })
}

/// Wie [`deserialisieren`], liefert bei ungueltigem Base64 aber einen
/// leeren Umschlag
///
/// Fuer den Empfangspfad, der nie abbrechen darf: der leere Umschlag
/// fuehrt bei der Entschluesselung zum Platzhalter.
pub fn deserialisieren_tolerant(text: &str) -> Envelope {
    deserialisieren(text).unwrap_or_else(|e| {
        tracing::debug!(fehler = %e, "Umschlag nicht dekodierbar");
        Envelope {
            nonce: Vec::new(),
            ciphertext: Vec::new(),
        }
    })
}
