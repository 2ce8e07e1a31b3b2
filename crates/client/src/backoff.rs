//! Exponentielle Wartezeit zwischen Verbindungsversuchen

use std::time::Duration;

/// Strategie fuer die Wiederverbindung
///
/// Versuch `k` (ab 1) wartet `basis * 2^(k-1)`. Nach `max_versuche`
/// Versuchen ist Schluss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_versuche: u32,
    pub basis: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::neu(5, Duration::from_millis(2000))
    }
}

impl ReconnectPolicy {
    pub fn neu(max_versuche: u32, basis: Duration) -> Self {
        Self {
            max_versuche,
            basis,
        }
    }

    /// Wartezeit vor Versuch `versuch` (1-basiert)
    pub fn verzoegerung(&self, versuch: u32) -> Duration {
        let faktor = 1u32
            .checked_shl(versuch.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.basis.saturating_mul(faktor)
    }

    /// Ob nach `bisher` Versuchen ein weiterer erlaubt ist
    pub fn weiterer_versuch_erlaubt(&self, bisher: u32) -> bool {
        bisher < self.max_versuche
    }
}
