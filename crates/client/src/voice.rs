//! Zustandsmodell einer Sprachaufnahme
//!
//! Die eigentliche Audio-Erfassung liefert Bytes per `push_chunk`; der
//! Rekorder sammelt sie und misst die Dauer.

use fluester_core::grenzen::MAX_AUFNAHME_SEK;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{ClientError, ClientResult};

/// Abgeschlossene Aufnahme
#[derive(Debug, Clone, PartialEq)]
pub struct Aufnahme {
    pub daten: Vec<u8>,
    pub dauer: Duration,
}

impl Aufnahme {
    /// Dauer in Sekunden, wie im Wire-Format
    pub fn dauer_sek(&self) -> f64 {
        self.dauer.as_secs_f64()
    }
}

#[derive(Debug)]
struct Laufend {
    start: Instant,
    daten: Vec<u8>,
}

/// Sammelt Audio-Bloecke zwischen `start` und `stop`
#[derive(Debug)]
pub struct VoiceRecorder {
    laufend: Option<Laufend>,
    max_dauer: Duration,
}

impl Default for VoiceRecorder {
    fn default() -> Self {
        Self::neu(Duration::from_secs(MAX_AUFNAHME_SEK))
    }
}

impl VoiceRecorder {
    pub fn neu(max_dauer: Duration) -> Self {
        Self {
            laufend: None,
            max_dauer,
        }
    }

    pub fn ist_aktiv(&self) -> bool {
        self.laufend.is_some()
    }

    /// Beginnt eine Aufnahme
    pub fn start(&mut self) -> ClientResult<()> {
        if self.laufend.is_some() {
            return Err(ClientError::Aufnahme("Aufnahme laeuft bereits".into()));
        }
        self.laufend = Some(Laufend {
            start: Instant::now(),
            daten: Vec::new(),
        });
        tracing::debug!("Aufnahme gestartet");
        Ok(())
    }

    /// Haengt einen Audio-Block an; ohne laufende Aufnahme wird er verworfen
    pub fn push_chunk(&mut self, block: &[u8]) -> bool {
        match self.laufend.as_mut() {
            Some(laufend) => {
                laufend.daten.extend_from_slice(block);
                true
            }
            None => false,
        }
    }

    /// Beendet die Aufnahme, mehrfacher Aufruf ist unschaedlich
    pub fn stop(&mut self) -> Option<Aufnahme> {
        let laufend = self.laufend.take()?;
        let aufnahme = Aufnahme {
            dauer: laufend.start.elapsed(),
            daten: laufend.daten,
        };
        tracing::debug!(
            dauer_sek = aufnahme.dauer_sek(),
            bytes = aufnahme.daten.len(),
            "Aufnahme beendet"
        );
        Some(aufnahme)
    }

    /// Bisherige Dauer der laufenden Aufnahme
    pub fn aktuelle_dauer(&self) -> Option<Duration> {
        self.laufend.as_ref().map(|l| l.start.elapsed())
    }

    /// Ob die Hoechstdauer erreicht ist und gestoppt werden sollte
    pub fn is_over_limit(&self) -> bool {
        self.aktuelle_dauer()
            .is_some_and(|dauer| dauer >= self.max_dauer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doppelter_start_ist_fehler() {
        let mut rec = VoiceRecorder::default();
        rec.start().unwrap();
        assert!(matches!(rec.start(), Err(ClientError::Aufnahme(_))));
    }

    #[test]
    fn stop_ist_idempotent() {
        let mut rec = VoiceRecorder::default();
        assert!(rec.stop().is_none());

        rec.start().unwrap();
        assert!(rec.push_chunk(&[1, 2]));
        assert!(rec.push_chunk(&[3]));
        let aufnahme = rec.stop().unwrap();
        assert_eq!(aufnahme.daten, vec![1, 2, 3]);

        assert!(rec.stop().is_none());
        assert!(!rec.push_chunk(&[4]));
        assert!(!rec.ist_aktiv());
    }

    #[tokio::test(start_paused = true)]
    async fn dauer_und_hoechstgrenze() {
        let mut rec = VoiceRecorder::neu(Duration::from_secs(300));
        rec.start().unwrap();

        tokio::time::advance(Duration::from_millis(2500)).await;
        assert!(!rec.is_over_limit());

        tokio::time::advance(Duration::from_secs(298)).await;
        assert!(rec.is_over_limit());

        let aufnahme = rec.stop().unwrap();
        assert!(aufnahme.dauer_sek() >= 300.5);
        assert!(!rec.is_over_limit());
    }
}
