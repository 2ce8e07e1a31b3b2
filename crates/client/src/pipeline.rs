//! Nachrichten-Pipeline
//!
//! Ausgehend: Inhalt verschluesseln, Umschlag serialisieren, in die
//! passende `WireMessage` verpacken und ueber den Kanal senden.
//! Eingehend: Kanal-Ereignisse an die Darstellung weiterreichen.

use fluester_core::Schweregrad;
use fluester_crypto::envelope;
use fluester_protocol::{NachrichtenArt, WireMessage};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::channel::{Channel, GeteilteCipherBox};
use crate::collaborators::{DateiKandidat, FileClassifier, NotificationSink, Presentation};
use crate::config::DateiEinstellungen;
use crate::error::{ClientError, ClientResult};
use crate::events::ChannelEvent;
use crate::files::{format_file_size, mime_aus_endung};
use crate::voice::Aufnahme;

/// Verbindet Kanal, CipherBox und die Umgebung des Clients
pub struct MessagePipeline {
    channel: Channel,
    cipher: GeteilteCipherBox,
    classifier: Arc<dyn FileClassifier>,
    hinweise: Arc<dyn NotificationSink>,
    max_dateigroesse: u64,
    max_dateianzahl: usize,
}

impl MessagePipeline {
    pub fn neu(
        channel: Channel,
        classifier: Arc<dyn FileClassifier>,
        hinweise: Arc<dyn NotificationSink>,
        dateien: &DateiEinstellungen,
    ) -> Self {
        Self {
            cipher: channel.cipher(),
            channel,
            classifier,
            hinweise,
            max_dateigroesse: dateien.max_groesse,
            max_dateianzahl: dateien.max_anzahl,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Sendet eine Textnachricht
    ///
    /// Leerer Text (nach Trimmen) wird ignoriert, Rueckgabe dann `false`.
    pub fn send_text(&self, text: &str) -> ClientResult<bool> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }

        let content = self
            .cipher
            .read()
            .encrypt_to_string(text)
            .map_err(|e| self.sendefehler("Nachricht", e.into()))?;
        self.channel.send(&WireMessage::text(content))?;
        Ok(true)
    }

    /// Sendet eine abgeschlossene Sprachaufnahme
    pub fn send_voice(&self, aufnahme: &Aufnahme) -> ClientResult<()> {
        let envelope = self
            .cipher
            .read()
            .encrypt(&aufnahme.daten)
            .map_err(|e| self.sendefehler("Sprachnachricht", e.into()))?;

        self.channel.send(&WireMessage::sprache(
            envelope::serialisieren(&envelope),
            aufnahme.dauer_sek(),
        ))
    }

    /// Sendet Dateien nacheinander
    ///
    /// Ungueltige oder zu grosse Dateien werden mit Hinweis uebersprungen,
    /// die uebrigen trotzdem gesendet. Gibt die Anzahl gesendeter Dateien
    /// zurueck.
    pub fn send_files(&self, dateien: Vec<DateiKandidat>) -> usize {
        let mut gesendet = 0;

        for datei in self.classifier.limit_files(dateien) {
            let validierung = self.classifier.validate(&datei);
            if !validierung.ist_gueltig() {
                self.hinweise.notify(
                    &format!("\"{}\": {}", datei.name, validierung.fehler.join(", ")),
                    Schweregrad::Warning,
                );
                continue;
            }

            if let Err(e) = self.groesse_pruefen(&datei.name, datei.groesse()) {
                tracing::debug!(datei = %datei.name, fehler = %e, "Datei abgelehnt");
                continue;
            }

            match self.datei_senden(&datei) {
                Ok(()) => gesendet += 1,
                Err(e) => {
                    tracing::warn!(datei = %datei.name, fehler = %e, "Datei nicht gesendet");
                    self.hinweise.notify(
                        &format!("Fehler beim Senden von \"{}\"", datei.name),
                        Schweregrad::Error,
                    );
                }
            }
        }

        gesendet
    }

    fn datei_senden(&self, datei: &DateiKandidat) -> ClientResult<()> {
        let verschluesselt =
            self.cipher
                .read()
                .encrypt_file(&datei.name, &datei.mime_typ, &datei.inhalt)?;

        self.channel.send(&WireMessage::datei(
            envelope::serialisieren(&verschluesselt.envelope),
            verschluesselt.name,
            verschluesselt.mime_typ,
            verschluesselt.groesse,
        ))
    }

    /// Prueft die Groesse vor dem Verschluesseln
    ///
    /// Zu grosse Dateien erzeugen einen Hinweis und `NutzlastZuGross`.
    fn groesse_pruefen(&self, name: &str, groesse: u64) -> ClientResult<()> {
        if groesse <= self.max_dateigroesse {
            return Ok(());
        }
        self.hinweise.notify(
            &format!(
                "Datei \"{name}\" zu gross (max {})",
                format_file_size(self.max_dateigroesse)
            ),
            Schweregrad::Warning,
        );
        Err(ClientError::NutzlastZuGross {
            groesse,
            max: self.max_dateigroesse,
        })
    }

    /// Liest Dateien von der Platte und sendet sie nacheinander
    ///
    /// Nur die ersten `max_anzahl` Pfade werden beachtet. Die Groesse wird
    /// vor dem Lesen geprueft; nicht lesbare, zu grosse oder nicht
    /// regulaere Dateien werden mit Hinweis uebersprungen.
    pub async fn send_file_paths(&self, pfade: &[impl AsRef<Path>]) -> usize {
        if pfade.len() > self.max_dateianzahl {
            self.hinweise.notify(
                &format!(
                    "Nur die ersten {} Dateien werden gesendet",
                    self.max_dateianzahl
                ),
                Schweregrad::Warning,
            );
        }

        let mut kandidaten = Vec::new();
        for pfad in pfade.iter().take(self.max_dateianzahl) {
            let pfad = pfad.as_ref();
            let name = pfad
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| pfad.display().to_string());

            match self.datei_lesen(pfad, &name).await {
                Ok(inhalt) => {
                    kandidaten.push(DateiKandidat::neu(name.clone(), mime_aus_endung(&name), inhalt))
                }
                Err(ClientError::NutzlastZuGross { .. }) => {}
                Err(e) => {
                    tracing::warn!(datei = %pfad.display(), fehler = %e, "Datei nicht lesbar");
                    self.hinweise.notify(
                        &format!("Datei \"{name}\" nicht lesbar"),
                        Schweregrad::Error,
                    );
                }
            }
        }
        self.send_files(kandidaten)
    }

    async fn datei_lesen(&self, pfad: &Path, name: &str) -> ClientResult<Vec<u8>> {
        let metadaten = tokio::fs::metadata(pfad).await?;
        if !metadaten.is_file() {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "keine regulaere Datei",
            )));
        }
        self.groesse_pruefen(name, metadaten.len())?;
        Ok(tokio::fs::read(pfad).await?)
    }

    /// Entschluesselt den Inhalt einer Sprachnachricht zur Wiedergabe
    pub fn decrypt_voice(&self, content: &str) -> Option<Vec<u8>> {
        self.rohdaten_entschluesseln(content, "Sprachnachricht")
    }

    /// Entschluesselt den Inhalt einer Dateinachricht zum Speichern
    pub fn decrypt_file(&self, content: &str) -> Option<Vec<u8>> {
        self.rohdaten_entschluesseln(content, "Datei")
    }

    fn rohdaten_entschluesseln(&self, content: &str, art: &str) -> Option<Vec<u8>> {
        let umschlag = envelope::deserialisieren_tolerant(content);
        match self
            .cipher
            .read()
            .decrypt_bytes(&umschlag.ciphertext, &umschlag.nonce)
        {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(art, fehler = %e, "Entschluesselung fehlgeschlagen");
                None
            }
        }
    }

    fn sendefehler(&self, art: &str, fehler: ClientError) -> ClientError {
        tracing::warn!(art, fehler = %fehler, "Senden fehlgeschlagen");
        self.hinweise
            .notify(&format!("Fehler beim Senden: {art}"), Schweregrad::Error);
        fehler
    }

    /// Reicht Kanal-Ereignisse an Darstellung und Hinweise weiter
    ///
    /// Der Task endet wenn der Kanal verworfen wird oder der Handle
    /// abgebrochen wird.
    pub fn praesentation_starten(&self, darstellung: Arc<dyn Presentation>) -> JoinHandle<()> {
        let mut rx = self.channel.subscribe();
        let hinweise = Arc::clone(&self.hinweise);

        tokio::spawn(async move {
            loop {
                let ereignis = match rx.recv().await {
                    Ok(e) => e,
                    Err(RecvError::Lagged(verpasst)) => {
                        tracing::warn!(verpasst, "Darstellung kommt nicht hinterher");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                weiterreichen(&ereignis, darstellung.as_ref(), hinweise.as_ref());
            }
        })
    }
}

fn weiterreichen(
    ereignis: &ChannelEvent,
    darstellung: &dyn Presentation,
    hinweise: &dyn NotificationSink,
) {
    match ereignis {
        ChannelEvent::Message(n) => {
            darstellung.render_message(NachrichtenArt::Text, &WireMessage::TextMessage(n.clone()))
        }
        ChannelEvent::VoiceMessage(n) => darstellung
            .render_message(NachrichtenArt::Sprache, &WireMessage::VoiceMessage(n.clone())),
        ChannelEvent::FileMessage(n) => darstellung
            .render_message(NachrichtenArt::Datei, &WireMessage::FileMessage(n.clone())),
        ChannelEvent::Notice { text, schweregrad } => hinweise.notify(text, *schweregrad),
        anderes => darstellung.ereignis(anderes),
    }
}
