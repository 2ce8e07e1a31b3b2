//! Ausgehende Warteschlange
//!
//! Ringpuffer fester Kapazitaet fuer bereits kodierte Frames. Ist der
//! Puffer voll, wird der aelteste Eintrag verdraengt.

use std::collections::VecDeque;

/// FIFO-Warteschlange fuer Frames waehrend der Kanal nicht offen ist
#[derive(Debug)]
pub struct OutboundQueue {
    eintraege: VecDeque<String>,
    kapazitaet: usize,
}

impl OutboundQueue {
    pub fn neu(kapazitaet: usize) -> Self {
        let kapazitaet = kapazitaet.max(1);
        Self {
            eintraege: VecDeque::with_capacity(kapazitaet),
            kapazitaet,
        }
    }

    /// Haengt einen Frame an
    ///
    /// Gibt den verdraengten aeltesten Frame zurueck, falls der Puffer
    /// voll war.
    pub fn einreihen(&mut self, frame: String) -> Option<String> {
        let verdraengt = if self.eintraege.len() >= self.kapazitaet {
            self.eintraege.pop_front()
        } else {
            None
        };
        self.eintraege.push_back(frame);
        verdraengt
    }

    /// Stellt nicht gesendete Frames in ihrer Reihenfolge wieder vorne an
    ///
    /// Gibt die Anzahl der Frames zurueck, die wegen der Kapazitaet
    /// verworfen wurden (die aeltesten).
    pub fn zurueckstellen(&mut self, frames: Vec<String>) -> usize {
        for frame in frames.into_iter().rev() {
            self.eintraege.push_front(frame);
        }
        let ueberschuss = self.eintraege.len().saturating_sub(self.kapazitaet);
        self.eintraege.drain(..ueberschuss);
        ueberschuss
    }

    /// Entnimmt alle Frames in Einreihungsreihenfolge
    pub fn alle_entnehmen(&mut self) -> Vec<String> {
        self.eintraege.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }

    pub fn kapazitaet(&self) -> usize {
        self.kapazitaet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{i}")).collect()
    }

    #[test]
    fn fifo_reihenfolge() {
        let mut q = OutboundQueue::neu(10);
        for f in frames(3) {
            assert!(q.einreihen(f).is_none());
        }
        assert_eq!(q.alle_entnehmen(), frames(3));
        assert!(q.is_empty());
    }

    #[test]
    fn aelteste_wird_verdraengt() {
        let mut q = OutboundQueue::neu(2);
        q.einreihen("a".into());
        q.einreihen("b".into());
        assert_eq!(q.einreihen("c".into()).as_deref(), Some("a"));
        assert_eq!(q.alle_entnehmen(), vec!["b", "c"]);
    }

    #[test]
    fn zurueckstellen_vor_neuen() {
        let mut q = OutboundQueue::neu(10);
        q.einreihen("neu".into());
        let verworfen = q.zurueckstellen(vec!["alt1".into(), "alt2".into()]);
        assert_eq!(verworfen, 0);
        assert_eq!(q.alle_entnehmen(), vec!["alt1", "alt2", "neu"]);
    }

    #[test]
    fn zurueckstellen_respektiert_kapazitaet() {
        let mut q = OutboundQueue::neu(2);
        q.einreihen("neu".into());
        let verworfen = q.zurueckstellen(vec!["alt1".into(), "alt2".into()]);
        assert_eq!(verworfen, 1);
        assert_eq!(q.alle_entnehmen(), vec!["alt2", "neu"]);
    }

    #[test]
    fn kapazitaet_mindestens_eins() {
        let mut q = OutboundQueue::neu(0);
        assert_eq!(q.kapazitaet(), 1);
        q.einreihen("a".into());
        assert_eq!(q.len(), 1);
    }
}
