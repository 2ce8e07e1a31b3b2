//! Gemeinsame Typen fuer das Kryptografie-Subsystem

/// Laenge der AES-GCM-Nonce in Bytes (fest im Umschlag-Format)
pub const NONCE_LAENGE: usize = 12;

/// Laenge eines AES-256-Schluessels in Bytes
pub const SCHLUESSEL_LAENGE: usize = 32;

/// Laenge des GCM-Auth-Tags, der an den Ciphertext angehaengt wird
pub const TAG_LAENGE: usize = 16;

/// Platzhalter fuer Nachrichten, die nicht entschluesselt werden konnten
pub const PLATZHALTER_NICHT_ENTSCHLUESSELBAR: &str = "[Nachricht nicht entschluesselbar]";

/// Platzhalter wenn beim Empfang noch kein Schluessel existiert
pub const PLATZHALTER_KEIN_SCHLUESSEL: &str = "[Verschluesselte Nachricht - kein Schluessel verfuegbar]";

/// Platzhalter fuer leere oder fehlende Inhalte
pub const PLATZHALTER_UNGUELTIG: &str = "[Ungueltige Nachricht]";

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ergebnis eines einzelnen Verschluesselungsaufrufs
///
/// `nonce` ist bei wohlgeformten Umschlaegen genau 12 Bytes lang. Ein aus
/// kaputter Eingabe deserialisierter Umschlag kann kuerzer sein; die
/// Entschluesselung schlaegt dann kontrolliert fehl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Ciphertext inkl. 16 Bytes Auth-Tag (angehaengt)
    pub ciphertext: Vec<u8>,
    /// Zufaellige Nonce
    pub nonce: Vec<u8>,
}

impl Envelope {
    /// Prueft ob Nonce-Laenge und Mindestgroesse des Ciphertexts stimmen
    pub fn ist_wohlgeformt(&self) -> bool {
        self.nonce.len() == NONCE_LAENGE && self.ciphertext.len() >= TAG_LAENGE
    }
}

/// Verschluesselte Datei samt Klartext-Metadaten
#[derive(Debug, Clone)]
pub struct VerschluesselteDatei {
    pub envelope: Envelope,
    pub name: String,
    pub mime_typ: String,
    /// Groesse des Klartexts in Bytes
    pub groesse: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_bytes_debug_ist_geschwaerzt() {
        let s = SecretBytes::new(vec![1, 2, 3]);
        let text = format!("{s:?}");
        assert!(text.contains("REDACTED"));
        assert!(!text.contains("1, 2, 3"));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn wohlgeformt_braucht_nonce_und_tag() {
        let ok = Envelope {
            ciphertext: vec![0; TAG_LAENGE],
            nonce: vec![0; NONCE_LAENGE],
        };
        assert!(ok.ist_wohlgeformt());

        let kurz = Envelope {
            ciphertext: vec![],
            nonce: vec![0; 5],
        };
        assert!(!kurz.ist_wohlgeformt());
    }
}
