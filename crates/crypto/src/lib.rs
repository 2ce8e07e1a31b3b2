//! # fluester-crypto
//!
//! Ende-zu-Ende Verschluesselung fuer Fluester.
//!
//! ## Module
//! - `cipher_box` - AES-256-GCM Schluessel und Ver-/Entschluesselung
//! - `envelope` - Base64-Umschlag (nonce || ciphertext)
//! - `hash` - SHA-256 Hex-Digest
//! - `types` - Gemeinsame Typen und Konstanten
//! - `error` - Fehlertypen

pub mod cipher_box;
pub mod envelope;
pub mod error;
pub mod hash;
pub mod types;

// Bequeme Re-Exports
pub use cipher_box::CipherBox;
pub use error::{CryptoError, CryptoResult};
pub use hash::hash;
pub use types::{
    Envelope, SecretBytes, VerschluesselteDatei, NONCE_LAENGE, PLATZHALTER_KEIN_SCHLUESSEL,
    PLATZHALTER_NICHT_ENTSCHLUESSELBAR, PLATZHALTER_UNGUELTIG, SCHLUESSEL_LAENGE, TAG_LAENGE,
};
