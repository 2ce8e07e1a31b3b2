//! Dateipruefung und Hilfsfunktionen fuer den Datei-Versand
//!
//! Erlaubt sind Bilder, Dokumente, Archive, Audio und Video aus einer
//! festen MIME-Tabelle. Dateinamen duerfen keine Pfad- oder Steuerzeichen
//! enthalten, keine reservierten Windows-Namen tragen und nicht auf eine
//! ausfuehrbare Endung enden.

use fluester_core::grenzen::{MAX_DATEIEN_PRO_SENDUNG, MAX_NUTZLAST_BYTES};

use crate::collaborators::{DateiKandidat, DateiKategorie, FileClassifier, Validierung};

const ERLAUBTE_TYPEN: &[(DateiKategorie, &[&str])] = &[
    (
        DateiKategorie::Bilder,
        &["image/jpeg", "image/png", "image/gif", "image/webp", "image/svg+xml"],
    ),
    (
        DateiKategorie::Dokumente,
        &[
            "application/pdf",
            "text/plain",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ],
    ),
    (
        DateiKategorie::Archive,
        &[
            "application/zip",
            "application/x-rar-compressed",
            "application/x-7z-compressed",
        ],
    ),
    (
        DateiKategorie::Audio,
        &["audio/mpeg", "audio/wav", "audio/ogg", "audio/webm"],
    ),
    (
        DateiKategorie::Video,
        &["video/mp4", "video/webm", "video/ogg"],
    ),
];

const GEFAEHRLICHE_ENDUNGEN: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "msi", "dll", "sys",
];

const MAX_NAMENSLAENGE: usize = 255;

/// Standard-Pruefung anhand der MIME-Tabelle
#[derive(Debug, Clone)]
pub struct MimeClassifier {
    pub max_groesse: u64,
    pub max_anzahl: usize,
}

impl Default for MimeClassifier {
    fn default() -> Self {
        Self {
            max_groesse: MAX_NUTZLAST_BYTES as u64,
            max_anzahl: MAX_DATEIEN_PRO_SENDUNG,
        }
    }
}

impl MimeClassifier {
    pub fn neu(max_groesse: u64, max_anzahl: usize) -> Self {
        Self {
            max_groesse,
            max_anzahl,
        }
    }
}

impl FileClassifier for MimeClassifier {
    fn validate(&self, datei: &DateiKandidat) -> Validierung {
        let mut fehler = Vec::new();

        if datei.groesse() > self.max_groesse {
            fehler.push(format!(
                "Datei zu gross (max {})",
                format_file_size(self.max_groesse)
            ));
        }
        if !ist_typ_erlaubt(&datei.mime_typ) {
            fehler.push("Dateityp nicht erlaubt".to_string());
        }
        if !ist_dateiname_sicher(&datei.name) {
            fehler.push("Dateiname nicht sicher".to_string());
        }

        Validierung { fehler }
    }

    fn category(&self, mime_typ: &str) -> DateiKategorie {
        kategorie(mime_typ)
    }

    fn limit_files(&self, mut dateien: Vec<DateiKandidat>) -> Vec<DateiKandidat> {
        if dateien.len() > self.max_anzahl {
            tracing::warn!(
                ausgewaehlt = dateien.len(),
                max = self.max_anzahl,
                "Zu viele Dateien, nur die ersten werden gesendet"
            );
            dateien.truncate(self.max_anzahl);
        }
        dateien
    }
}

/// Kategorie eines MIME-Typs laut Tabelle
pub fn kategorie(mime_typ: &str) -> DateiKategorie {
    ERLAUBTE_TYPEN
        .iter()
        .find(|(_, typen)| typen.contains(&mime_typ))
        .map(|(kat, _)| *kat)
        .unwrap_or(DateiKategorie::Unbekannt)
}

pub fn ist_typ_erlaubt(mime_typ: &str) -> bool {
    kategorie(mime_typ) != DateiKategorie::Unbekannt
}

/// Prueft einen Dateinamen auf gefaehrliche Zeichen, Namen und Endungen
pub fn ist_dateiname_sicher(name: &str) -> bool {
    if name.is_empty() || name.chars().count() > MAX_NAMENSLAENGE {
        return false;
    }

    if name
        .chars()
        .any(|c| matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c < '\u{20}')
    {
        return false;
    }

    // Reserviert ist der Teil vor dem ersten Punkt (CON.txt ist verboten)
    let stamm = name.split('.').next().unwrap_or_default().to_ascii_uppercase();
    let reserviert = matches!(stamm.as_str(), "CON" | "PRN" | "AUX" | "NUL")
        || ((stamm.starts_with("COM") || stamm.starts_with("LPT"))
            && stamm.len() == 4
            && matches!(stamm.as_bytes()[3], b'1'..=b'9'));
    if reserviert {
        return false;
    }

    match name.rsplit_once('.') {
        Some((_, endung)) => !GEFAEHRLICHE_ENDUNGEN.contains(&endung.to_ascii_lowercase().as_str()),
        None => true,
    }
}

/// Menschenlesbare Groesse: `0 Bytes`, `1.5 KB`, `10 MB`
pub fn format_file_size(bytes: u64) -> String {
    const EINHEITEN: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut wert = bytes as f64;
    let mut stufe = 0;
    while wert >= 1024.0 && stufe < EINHEITEN.len() - 1 {
        wert /= 1024.0;
        stufe += 1;
    }

    let gerundet = (wert * 100.0).round() / 100.0;
    format!("{gerundet} {}", EINHEITEN[stufe])
}

/// MIME-Typ aus der Dateiendung, `application/octet-stream` wenn unbekannt
pub fn mime_aus_endung(name: &str) -> &'static str {
    let endung = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();

    match endung.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "weba" => "audio/webm",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}
