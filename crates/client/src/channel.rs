//! Kanal zum Relay
//!
//! Ein Treiber-Task besitzt die WebSocket-Verbindung, liest eingehende
//! Frames und plant Wiederverbindungen. Aufrufer sprechen ueber ein
//! klonbares [`Channel`]-Handle mit ihm und abonnieren typisierte
//! [`ChannelEvent`]s.
//!
//! ## Zustandsmaschine
//! ```text
//! Getrennt -> Verbindend -> Offen -> Schliessend -> Getrennt
//!                 ^           |
//!                 |           v
//!                 +-- WartetAufWiederverbindung -> Erschoepft
//! ```
//!
//! Nur die Close-Codes 1000 und 1001 gelten als absichtlich. Jeder andere
//! Abbruch, auch ein fehlgeschlagener Verbindungsaufbau, fuehrt zum
//! naechsten Versuch nach `basis * 2^(k-1)`.

use fluester_core::Schweregrad;
use fluester_crypto::{CipherBox, PLATZHALTER_KEIN_SCHLUESSEL, PLATZHALTER_UNGUELTIG};
use fluester_protocol::{
    dekodieren, ist_absichtlicher_close, kodieren, ProtocolError, WireMessage, CLOSE_ABNORMAL,
    CLOSE_NORMAL,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::backoff::ReconnectPolicy;
use crate::config::ClientConfig;
use crate::endpoint::websocket_url;
use crate::error::{ClientError, ClientResult};
use crate::events::{ChannelEvent, EVENT_BUS_KAPAZITAET};
use crate::queue::OutboundQueue;
use crate::transport::{self, WsMessage, WsReader, WsWriter};

/// Zwischen Kanal und Pipeline geteilte CipherBox
pub type GeteilteCipherBox = Arc<RwLock<CipherBox>>;

/// Verbindungsphase des Kanals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Getrennt,
    Verbindend,
    Offen,
    Schliessend,
    WartetAufWiederverbindung,
    /// Alle Versuche aufgebraucht, nur ein erneutes `connect()` hilft
    Erschoepft,
}

struct Zustand {
    phase: Phase,
    queue: OutboundQueue,
    /// Weg zum Schreiber der offenen Sitzung
    writer: Option<mpsc::UnboundedSender<String>>,
    versuche: u32,
}

struct ChannelInner {
    url: String,
    policy: ReconnectPolicy,
    cipher: GeteilteCipherBox,
    zustand: Mutex<Zustand>,
    events: broadcast::Sender<ChannelEvent>,
    stopp: watch::Sender<bool>,
    treiber: Mutex<Option<JoinHandle<()>>>,
}

/// Handle auf den Kanal (Clone teilt den Zustand)
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    /// Erstellt einen getrennten Kanal zu `url` (`ws://` oder `wss://`)
    pub fn neu(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        queue_kapazitaet: usize,
        cipher: GeteilteCipherBox,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUS_KAPAZITAET);
        let (stopp, _) = watch::channel(false);

        Self {
            inner: Arc::new(ChannelInner {
                url: url.into(),
                policy,
                cipher,
                zustand: Mutex::new(Zustand {
                    phase: Phase::Getrennt,
                    queue: OutboundQueue::neu(queue_kapazitaet),
                    writer: None,
                    versuche: 0,
                }),
                events,
                stopp,
                treiber: Mutex::new(None),
            }),
        }
    }

    /// Erstellt einen Kanal aus der Client-Konfiguration
    pub fn aus_config(config: &ClientConfig, cipher: GeteilteCipherBox) -> ClientResult<Self> {
        Ok(Self::neu(
            websocket_url(&config.origin)?,
            config.reconnect_policy(),
            config.queue.kapazitaet,
            cipher,
        ))
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn cipher(&self) -> GeteilteCipherBox {
        Arc::clone(&self.inner.cipher)
    }

    /// Abonniert alle kuenftigen Ereignisse
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.inner.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.inner.zustand.lock().phase
    }

    pub fn ist_offen(&self) -> bool {
        self.phase() == Phase::Offen
    }

    /// Anzahl wartender Frames
    pub fn queue_laenge(&self) -> usize {
        self.inner.zustand.lock().queue.len()
    }

    #[cfg(test)]
    pub(crate) fn wartende_frames_entnehmen(&self) -> Vec<String> {
        self.inner.zustand.lock().queue.alle_entnehmen()
    }

    /// Startet den Treiber-Task
    ///
    /// Laeuft bereits ein Treiber, passiert nichts. Nach Erschoepfung oder
    /// `disconnect()` beginnt ein neuer Treiber mit frischem Versuchszaehler.
    pub fn connect(&self) {
        let mut treiber = self.inner.treiber.lock();
        if treiber.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        self.inner.stopp.send_replace(false);
        self.inner.zustand.lock().versuche = 0;

        let inner = Arc::clone(&self.inner);
        let stopp_rx = self.inner.stopp.subscribe();
        *treiber = Some(tokio::spawn(inner.treiber_schleife(stopp_rx)));
    }

    /// Sendet eine Nachricht oder stellt sie in die Warteschlange
    pub fn send(&self, nachricht: &WireMessage) -> ClientResult<()> {
        let frame = kodieren(nachricht)?;
        self.inner.frame_senden(frame);
        Ok(())
    }

    /// Schliesst absichtlich mit Code 1000, ohne Wiederverbindung
    ///
    /// Wartet bis der Treiber beendet ist.
    pub async fn disconnect(&self) {
        self.inner.stopp.send_replace(true);
        let handle = self.inner.treiber.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(fehler = %e, "Treiber-Task abgebrochen");
            }
        }
        self.inner.zustand.lock().phase = Phase::Getrennt;
    }
}

/// Kehrt zurueck sobald der Stopp-Wert `true` ist
async fn stopp_abwarten(rx: &mut watch::Receiver<bool>) {
    loop {
        let gestoppt = *rx.borrow_and_update();
        if gestoppt {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl ChannelInner {
    fn melden(&self, ereignis: ChannelEvent) {
        // Ohne Abonnenten geht das Ereignis verloren
        let _ = self.events.send(ereignis);
    }

    fn hinweis(&self, text: impl Into<String>, schweregrad: Schweregrad) {
        self.melden(ChannelEvent::hinweis(text, schweregrad));
    }

    fn phase_setzen(&self, phase: Phase) {
        self.zustand.lock().phase = phase;
    }

    fn frame_senden(&self, frame: String) {
        let mut z = self.zustand.lock();

        let frame = match (z.phase, &z.writer) {
            (Phase::Offen, Some(writer)) => match writer.send(frame) {
                Ok(()) => return,
                Err(mpsc::error::SendError(frame)) => frame,
            },
            _ => frame,
        };

        let verdraengt = z.queue.einreihen(frame).is_some();
        let wartend = z.queue.len();
        drop(z);

        if verdraengt {
            tracing::warn!(kapazitaet = wartend, "Warteschlange voll – aelteste Nachricht verworfen");
            self.hinweis(
                "Warteschlange voll, aelteste Nachricht verworfen",
                Schweregrad::Warning,
            );
        }
        tracing::debug!(wartend, "Nachricht in Warteschlange");
        self.melden(ChannelEvent::Queued { wartend });
        self.hinweis(
            "Verbindung unterbrochen, Nachricht wartet",
            Schweregrad::Warning,
        );
    }

    async fn treiber_schleife(self: Arc<Self>, mut stopp_rx: watch::Receiver<bool>) {
        loop {
            self.phase_setzen(Phase::Verbindend);
            tracing::debug!(url = %self.url, "Verbindungsaufbau");

            let verbindung = tokio::select! {
                biased;
                _ = stopp_abwarten(&mut stopp_rx) => {
                    self.phase_setzen(Phase::Getrennt);
                    return;
                }
                v = transport::verbinden(&self.url) => v,
            };

            let code = match verbindung {
                Ok((writer, reader)) => self.sitzung(writer, reader, &mut stopp_rx).await,
                Err(e) => {
                    tracing::warn!(url = %self.url, fehler = %e, "Verbindungsaufbau fehlgeschlagen");
                    self.melden(ChannelEvent::Error(e.to_string()));
                    self.hinweis("Verbindungsfehler", Schweregrad::Error);
                    CLOSE_ABNORMAL
                }
            };

            self.melden(ChannelEvent::Disconnected { code });

            let gestoppt = *stopp_rx.borrow();
            if gestoppt || ist_absichtlicher_close(code) {
                tracing::info!(code, "Verbindung geschlossen");
                self.phase_setzen(Phase::Getrennt);
                self.hinweis("Verbindung geschlossen", Schweregrad::Info);
                return;
            }

            let versuch = {
                let mut z = self.zustand.lock();
                if self.policy.weiterer_versuch_erlaubt(z.versuche) {
                    z.versuche += 1;
                    z.phase = Phase::WartetAufWiederverbindung;
                    Some(z.versuche)
                } else {
                    z.phase = Phase::Erschoepft;
                    None
                }
            };

            let Some(versuch) = versuch else {
                let fehler = ClientError::WiederverbindungErschoepft {
                    versuche: self.policy.max_versuche,
                };
                tracing::error!(fehler = %fehler, "Verbindung verloren");
                self.melden(ChannelEvent::ReconnectExhausted);
                self.hinweis(
                    format!("{fehler}. Bitte Client neu starten."),
                    Schweregrad::Error,
                );
                return;
            };

            let verzoegerung = self.policy.verzoegerung(versuch);
            tracing::info!(
                code,
                versuch,
                max = self.policy.max_versuche,
                verzoegerung_ms = verzoegerung.as_millis() as u64,
                "Wiederverbindung geplant"
            );
            self.melden(ChannelEvent::ReconnectScheduled {
                versuch,
                verzoegerung,
            });
            self.hinweis(
                format!(
                    "Neuer Verbindungsversuch in {}s ({versuch}/{})",
                    verzoegerung.as_secs_f64(),
                    self.policy.max_versuche
                ),
                Schweregrad::Warning,
            );

            tokio::select! {
                biased;
                _ = stopp_abwarten(&mut stopp_rx) => {
                    self.phase_setzen(Phase::Getrennt);
                    return;
                }
                _ = tokio::time::sleep(verzoegerung) => {}
            }
        }
    }

    /// Bedient eine offene Verbindung und liefert den Close-Code
    async fn sitzung(
        &self,
        mut writer: WsWriter,
        mut reader: WsReader,
        stopp_rx: &mut watch::Receiver<bool>,
    ) -> u16 {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        // Warteschlange unter demselben Lock in die Sitzung uebernehmen,
        // damit neue Nachrichten sich hinten anstellen
        let nachgereicht = {
            let mut z = self.zustand.lock();
            z.versuche = 0;
            z.phase = Phase::Offen;
            let ausstehend = z.queue.alle_entnehmen();
            let anzahl = ausstehend.len();
            for frame in ausstehend {
                let _ = tx.send(frame);
            }
            z.writer = Some(tx);
            anzahl
        };

        tracing::info!(url = %self.url, nachgereicht, "Verbindung hergestellt");
        self.melden(ChannelEvent::Connected);
        self.hinweis("Verbindung hergestellt", Schweregrad::Success);

        let code = loop {
            tokio::select! {
                biased;

                _ = stopp_abwarten(stopp_rx) => {
                    {
                        let mut z = self.zustand.lock();
                        z.phase = Phase::Schliessend;
                        z.writer = None;
                    }
                    // Bereits angenommene Nachrichten noch zustellen
                    while let Ok(frame) = rx.try_recv() {
                        if writer.send_text(frame).await.is_err() {
                            break;
                        }
                    }
                    if let Err(e) = writer.send_close(CLOSE_NORMAL, "Absichtlich getrennt").await {
                        tracing::debug!(fehler = %e, "Close-Frame nicht gesendet");
                    }
                    break CLOSE_NORMAL;
                }

                ausgehend = rx.recv() => {
                    let Some(frame) = ausgehend else {
                        break CLOSE_ABNORMAL;
                    };
                    if let Err(e) = writer.send_text(frame).await {
                        tracing::warn!(fehler = %e, "Senden fehlgeschlagen");
                        self.melden(ChannelEvent::Error(e.to_string()));
                        break CLOSE_ABNORMAL;
                    }
                }

                eingehend = reader.recv() => {
                    match eingehend {
                        Some(Ok(WsMessage::Text(text))) => self.eingehend_verarbeiten(&text),
                        Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes) {
                            Ok(text) => self.eingehend_verarbeiten(&text),
                            Err(_) => tracing::warn!("Binaerframe ohne UTF-8 verworfen"),
                        },
                        Some(Ok(WsMessage::Close { code, reason })) => {
                            tracing::info!(code, grund = %reason, "Close-Frame empfangen");
                            break code;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(fehler = %e, "Verbindung abgerissen");
                            self.melden(ChannelEvent::Error(e.to_string()));
                            break CLOSE_ABNORMAL;
                        }
                        None => break CLOSE_ABNORMAL,
                    }
                }
            }
        };

        // Nicht geschriebene Frames zurueck in die Warteschlange
        let mut z = self.zustand.lock();
        z.writer = None;
        z.phase = Phase::Getrennt;
        rx.close();
        let mut rest = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            rest.push(frame);
        }
        if !rest.is_empty() {
            let zurueck = rest.len();
            let verworfen = z.queue.zurueckstellen(rest);
            tracing::debug!(zurueck, verworfen, "Ungesendete Nachrichten zurueckgestellt");
        }

        code
    }

    /// Dekodiert einen eingehenden Frame und verteilt ihn als Ereignis
    fn eingehend_verarbeiten(&self, text: &str) {
        let nachricht = match dekodieren(text) {
            Ok(n) => n,
            Err(ProtocolError::UnbekannterTyp(typ)) => {
                tracing::warn!(typ = %typ, "Unbekannter Nachrichtentyp");
                return;
            }
            Err(e) => {
                tracing::warn!(fehler = %e, "Ungueltige Nachricht verworfen");
                return;
            }
        };

        let ereignis = match nachricht {
            WireMessage::UserId { user_id } => ChannelEvent::UserId(user_id),
            WireMessage::UserCount { count } => ChannelEvent::UserCount(count),
            WireMessage::TextMessage(mut n) => {
                n.content = self.text_entschluesseln(&n.content);
                ChannelEvent::Message(n)
            }
            WireMessage::VoiceMessage(n) => ChannelEvent::VoiceMessage(n),
            WireMessage::FileMessage(n) => ChannelEvent::FileMessage(n),
        };
        self.melden(ereignis);
    }

    fn text_entschluesseln(&self, content: &str) -> String {
        let cipher = self.cipher.read();
        if !cipher.is_ready() {
            return PLATZHALTER_KEIN_SCHLUESSEL.to_string();
        }
        if content.trim().is_empty() {
            return PLATZHALTER_UNGUELTIG.to_string();
        }
        cipher.decrypt_from_string(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluester_crypto::PLATZHALTER_NICHT_ENTSCHLUESSELBAR;

    fn kanal_mit_schluessel() -> (Channel, GeteilteCipherBox) {
        let mut cb = CipherBox::new();
        cb.generate_key().unwrap();
        let cipher = Arc::new(RwLock::new(cb));
        let kanal = Channel::neu(
            "ws://127.0.0.1:9/",
            ReconnectPolicy::default(),
            3,
            cipher.clone(),
        );
        (kanal, cipher)
    }

    fn naechstes(rx: &mut broadcast::Receiver<ChannelEvent>) -> ChannelEvent {
        rx.try_recv().expect("Ereignis erwartet")
    }

    #[test]
    fn textnachricht_wird_entschluesselt() {
        let (kanal, cipher) = kanal_mit_schluessel();
        let mut rx = kanal.subscribe();

        let content = cipher.read().encrypt_to_string("hallo").unwrap();
        let frame = format!(
            r#"{{"type":"text_message","content":"{content}","userId":"Guest2","timestamp":5}}"#
        );
        kanal.inner.eingehend_verarbeiten(&frame);

        match naechstes(&mut rx) {
            ChannelEvent::Message(n) => {
                assert_eq!(n.content, "hallo");
                assert_eq!(n.user_id.as_deref(), Some("Guest2"));
                assert_eq!(n.timestamp, Some(5));
            }
            anderes => panic!("unerwartetes Ereignis: {anderes:?}"),
        }
    }

    #[test]
    fn ohne_schluessel_platzhalter() {
        let kanal = Channel::neu(
            "ws://127.0.0.1:9/",
            ReconnectPolicy::default(),
            3,
            Arc::new(RwLock::new(CipherBox::new())),
        );
        let mut rx = kanal.subscribe();
        kanal
            .inner
            .eingehend_verarbeiten(r#"{"type":"text_message","content":"AAAA"}"#);

        assert!(matches!(
            naechstes(&mut rx),
            ChannelEvent::Message(n) if n.content == PLATZHALTER_KEIN_SCHLUESSEL
        ));
    }

    #[test]
    fn kaputter_inhalt_platzhalter() {
        let (kanal, _) = kanal_mit_schluessel();
        let mut rx = kanal.subscribe();

        kanal
            .inner
            .eingehend_verarbeiten(r#"{"type":"text_message","content":"AAAA"}"#);
        assert!(matches!(
            naechstes(&mut rx),
            ChannelEvent::Message(n) if n.content == PLATZHALTER_NICHT_ENTSCHLUESSELBAR
        ));

        kanal
            .inner
            .eingehend_verarbeiten(r#"{"type":"text_message","content":""}"#);
        assert!(matches!(
            naechstes(&mut rx),
            ChannelEvent::Message(n) if n.content == PLATZHALTER_UNGUELTIG
        ));
    }

    #[test]
    fn verwaltungsnachrichten_und_muell() {
        let (kanal, _) = kanal_mit_schluessel();
        let mut rx = kanal.subscribe();

        kanal.inner.eingehend_verarbeiten("{kaputt");
        kanal.inner.eingehend_verarbeiten(r#"{"type":"typing"}"#);
        kanal
            .inner
            .eingehend_verarbeiten(r#"{"type":"user_id","userId":"Guest4"}"#);
        kanal
            .inner
            .eingehend_verarbeiten(r#"{"type":"user_count","count":2}"#);

        assert_eq!(naechstes(&mut rx), ChannelEvent::UserId("Guest4".into()));
        assert_eq!(naechstes(&mut rx), ChannelEvent::UserCount(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sprachnachricht_bleibt_verschluesselt() {
        let (kanal, _) = kanal_mit_schluessel();
        let mut rx = kanal.subscribe();
        kanal.inner.eingehend_verarbeiten(
            r#"{"type":"voice_message","content":"QUJD","duration":1.5,"userId":"Guest1"}"#,
        );
        assert!(matches!(
            naechstes(&mut rx),
            ChannelEvent::VoiceMessage(n) if n.content == "QUJD" && n.duration == 1.5
        ));
    }

    #[test]
    fn senden_ohne_verbindung_reiht_ein() {
        let (kanal, _) = kanal_mit_schluessel();
        let mut rx = kanal.subscribe();

        kanal.send(&WireMessage::text("a")).unwrap();
        assert_eq!(kanal.queue_laenge(), 1);
        assert_eq!(naechstes(&mut rx), ChannelEvent::Queued { wartend: 1 });
        assert!(matches!(
            naechstes(&mut rx),
            ChannelEvent::Notice { schweregrad: Schweregrad::Warning, .. }
        ));
    }

    #[test]
    fn volle_warteschlange_verdraengt() {
        let (kanal, _) = kanal_mit_schluessel();
        for i in 0..5 {
            kanal.send(&WireMessage::text(format!("m{i}"))).unwrap();
        }
        assert_eq!(kanal.queue_laenge(), 3);

        let frames = kanal.wartende_frames_entnehmen();
        let inhalte: Vec<String> = frames
            .iter()
            .map(|f| match dekodieren(f).unwrap() {
                WireMessage::TextMessage(n) => n.content,
                anderes => panic!("unerwartet: {anderes:?}"),
            })
            .collect();
        assert_eq!(inhalte, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn anfangszustand() {
        let (kanal, _) = kanal_mit_schluessel();
        assert_eq!(kanal.phase(), Phase::Getrennt);
        assert!(!kanal.ist_offen());
        assert_eq!(kanal.url(), "ws://127.0.0.1:9/");
    }
}
