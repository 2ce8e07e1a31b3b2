//! SHA-256 Hilfsfunktion

use sha2::{Digest, Sha256};

/// SHA-256 ueber die UTF-8-Bytes, als 64 Zeichen Hex in Kleinbuchstaben
pub fn hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
