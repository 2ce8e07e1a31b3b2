//! JSON-Codec fuer Textframes
//!
//! Client-seitig werden Frames typisiert (`WireMessage`) gelesen und
//! geschrieben. Das Relay dagegen arbeitet typ-agnostisch: es prueft nur
//! Groesse und Objektform und stempelt Absender und Zeit in den Frame,
//! alle uebrigen Felder bleiben unveraendert.

use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::WireMessage;

// ---------------------------------------------------------------------------
// Close-Codes
// ---------------------------------------------------------------------------

/// Normales, absichtliches Schliessen
pub const CLOSE_NORMAL: u16 = 1000;

/// Gegenseite verlaesst die Verbindung (Seite neu geladen, Server stoppt)
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Kein Close-Frame empfangen (Verbindung abgerissen)
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Prueft ob ein Close-Code ein absichtliches Schliessen signalisiert
///
/// Nur 1000 und 1001 unterdruecken die automatische Wiederverbindung.
pub fn ist_absichtlicher_close(code: u16) -> bool {
    matches!(code, CLOSE_NORMAL | CLOSE_GOING_AWAY)
}

// ---------------------------------------------------------------------------
// Typisierter Codec (Client)
// ---------------------------------------------------------------------------

/// Serialisiert eine Nachricht als JSON-Text
pub fn kodieren(nachricht: &WireMessage) -> ProtocolResult<String> {
    Ok(serde_json::to_string(nachricht)?)
}

/// Liest einen JSON-Textframe als `WireMessage`
///
/// Unterscheidet zwischen syntaktisch kaputtem JSON, Nicht-Objekten und
/// unbekannten `type`-Werten, damit der Aufrufer passend loggen kann.
pub fn dekodieren(text: &str) -> ProtocolResult<WireMessage> {
    let wert: Value = serde_json::from_str(text)?;
    let objekt = wert.as_object().ok_or(ProtocolError::KeinObjekt)?;

    let typ = objekt
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !WireMessage::TYPEN.contains(&typ) {
        return Err(ProtocolError::UnbekannterTyp(typ.to_string()));
    }

    Ok(serde_json::from_value(wert)?)
}

// ---------------------------------------------------------------------------
// Relay-Stempel
// ---------------------------------------------------------------------------

/// Prueft einen eingehenden Frame und stempelt Absender und Zeit
///
/// - Frames groesser als `max_bytes` werden abgelehnt
/// - Der Frame muss ein JSON-Objekt sein
/// - `userId` und `timestamp` werden immer ueberschrieben, eine vom Client
///   mitgeschickte Identitaet wird ignoriert
pub fn stempeln(
    roh: &str,
    max_bytes: usize,
    user_id: &str,
    timestamp: u64,
) -> ProtocolResult<String> {
    if roh.len() > max_bytes {
        return Err(ProtocolError::NutzlastZuGross {
            groesse: roh.len(),
            max: max_bytes,
        });
    }

    let mut wert: Value = serde_json::from_str(roh)?;
    let objekt = wert.as_object_mut().ok_or(ProtocolError::KeinObjekt)?;
    objekt.insert("timestamp".into(), Value::from(timestamp));
    objekt.insert("userId".into(), Value::from(user_id));

    Ok(serde_json::to_string(&wert)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
