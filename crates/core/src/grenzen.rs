//! Systemweite Grenzwerte
//!
//! Relay und Client pruefen dieselbe Obergrenze unabhaengig voneinander.

/// Maximale Groesse eines Frames bzw. einer Datei (10 MiB)
pub const MAX_NUTZLAST_BYTES: usize = 10 * 1024 * 1024;

/// Maximale Anzahl Dateien pro Sendevorgang
pub const MAX_DATEIEN_PRO_SENDUNG: usize = 5;

/// Maximale Dauer einer Sprachaufnahme in Sekunden
pub const MAX_AUFNAHME_SEK: u64 = 300;
