//! CipherBox: symmetrische Verschluesselung fuer Chat-Inhalte
//!
//! Haelt hoechstens einen AES-256-GCM-Schluessel. Jeder Aufruf von
//! [`CipherBox::encrypt`] zieht eine frische 12-Byte-Nonce aus dem
//! Betriebssystem-RNG. Der Auth-Tag (16 Bytes) haengt am Ciphertext.
//!
//! ## Schluesselmodell
//! Alle Teilnehmer einer Unterhaltung muessen denselben Schluessel halten.
//! Ein frisch generierter Schluessel wird per [`CipherBox::export_key`]
//! ausserhalb des Relays weitergegeben und beim Gegenueber mit
//! [`CipherBox::import_key`] geladen. Der Schluessel verlaesst den Prozess
//! nie ueber das Relay.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::envelope;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{
    Envelope, SecretBytes, VerschluesselteDatei, NONCE_LAENGE, PLATZHALTER_NICHT_ENTSCHLUESSELBAR,
    SCHLUESSEL_LAENGE,
};

/// Symmetrische Verschluesselungs-Box mit optionalem Schluessel
#[derive(Debug, Default)]
pub struct CipherBox {
    schluessel: Option<SecretBytes>,
}

impl CipherBox {
    /// Erstellt eine Box ohne Schluessel
    pub fn new() -> Self {
        Self::default()
    }

    /// Prueft ob AES-256-GCM und ein Zufallsgenerator verfuegbar sind
    ///
    /// Die Implementierung ist reines Rust; geprueft wird nur, ob der
    /// Betriebssystem-RNG Bytes liefert.
    pub fn is_supported() -> bool {
        let mut probe = [0u8; 1];
        OsRng.try_fill_bytes(&mut probe).is_ok()
    }

    /// Erzeugt einen neuen zufaelligen 256-Bit-Schluessel
    ///
    /// Ein vorhandener Schluessel wird ersetzt.
    pub fn generate_key(&mut self) -> CryptoResult<()> {
        let mut bytes = vec![0u8; SCHLUESSEL_LAENGE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
        self.schluessel = Some(SecretBytes::new(bytes));
        tracing::debug!("Neuer Sitzungsschluessel generiert");
        Ok(())
    }

    /// Laedt einen vorhandenen Rohschluessel (32 Bytes)
    pub fn import_key(&mut self, rohschluessel: &[u8]) -> CryptoResult<()> {
        if rohschluessel.len() != SCHLUESSEL_LAENGE {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: SCHLUESSEL_LAENGE,
                erhalten: rohschluessel.len(),
            });
        }
        self.schluessel = Some(SecretBytes::new(rohschluessel.to_vec()));
        Ok(())
    }

    /// Laedt einen Base64-kodierten Rohschluessel
    pub fn import_key_base64(&mut self, text: &str) -> CryptoResult<()> {
        let bytes = SecretBytes::new(STANDARD.decode(text.trim())?);
        self.import_key(bytes.as_bytes())
    }

    /// Exportiert den aktuellen Schluessel als Base64
    pub fn export_key(&self) -> CryptoResult<String> {
        let schluessel = self.schluessel.as_ref().ok_or(CryptoError::NichtBereit)?;
        Ok(STANDARD.encode(schluessel.as_bytes()))
    }

    /// `true` sobald ein Schluessel vorhanden ist
    pub fn is_ready(&self) -> bool {
        self.schluessel.is_some()
    }

    /// Verwirft den Schluessel (wird dabei genullt)
    pub fn cleanup(&mut self) {
        self.schluessel = None;
    }

    fn cipher(&self) -> CryptoResult<Aes256Gcm> {
        let schluessel = self.schluessel.as_ref().ok_or(CryptoError::NichtBereit)?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(
            schluessel.as_bytes(),
        )))
    }

    /// Verschluesselt Klartext mit frischer Nonce
    pub fn encrypt(&self, klartext: impl AsRef<[u8]>) -> CryptoResult<Envelope> {
        let cipher = self.cipher()?;

        let mut nonce = vec![0u8; NONCE_LAENGE];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), klartext.as_ref())
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        Ok(Envelope { ciphertext, nonce })
    }

    /// Verschluesselt Text und serialisiert den Umschlag direkt
    pub fn encrypt_to_string(&self, klartext: &str) -> CryptoResult<String> {
        Ok(envelope::serialisieren(&self.encrypt(klartext)?))
    }

    /// Verschluesselt den Inhalt einer Datei
    ///
    /// Name, MIME-Typ und Groesse bleiben Klartext-Metadaten.
    pub fn encrypt_file(
        &self,
        name: impl Into<String>,
        mime_typ: impl Into<String>,
        inhalt: &[u8],
    ) -> CryptoResult<VerschluesselteDatei> {
        Ok(VerschluesselteDatei {
            envelope: self.encrypt(inhalt)?,
            name: name.into(),
            mime_typ: mime_typ.into(),
            groesse: inhalt.len() as u64,
        })
    }

    /// Entschluesselt zu Rohbytes
    ///
    /// Schlaegt fehl bei fehlendem Schluessel, falscher Nonce-Laenge,
    /// manipuliertem Ciphertext oder falschem Schluessel.
    pub fn decrypt_bytes(&self, ciphertext: &[u8], nonce: &[u8]) -> CryptoResult<Vec<u8>> {
        let cipher = self.cipher()?;
        if nonce.len() != NONCE_LAENGE {
            return Err(CryptoError::UngueltigeNonce {
                erwartet: NONCE_LAENGE,
                erhalten: nonce.len(),
            });
        }

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
    }

    /// Entschluesselt zu Text, schlaegt nie fehl
    ///
    /// Jeder Fehler ergibt den Platzhalter
    /// [`PLATZHALTER_NICHT_ENTSCHLUESSELBAR`]. Ungueltiges UTF-8 wird
    /// verlustbehaftet ersetzt.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8]) -> String {
        match self.decrypt_bytes(ciphertext, nonce) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(fehler = %e, "Nachricht nicht entschluesselbar");
                PLATZHALTER_NICHT_ENTSCHLUESSELBAR.to_string()
            }
        }
    }

    /// Entschluesselt einen Umschlag zu Text (siehe [`CipherBox::decrypt`])
    pub fn decrypt_envelope(&self, envelope: &Envelope) -> String {
        self.decrypt(&envelope.ciphertext, &envelope.nonce)
    }

    /// Deserialisiert und entschluesselt einen Base64-Umschlag zu Text
    pub fn decrypt_from_string(&self, text: &str) -> String {
        self.decrypt_envelope(&envelope::deserialisieren_tolerant(text))
    }
}
