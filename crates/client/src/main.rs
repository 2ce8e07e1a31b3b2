//! Fluester Terminal-Client – Einstiegspunkt
//!
//! Liest Zeilen von stdin und sendet sie verschluesselt an das Relay.
//!
//! Befehle:
//! - `/file <pfad>` – Datei senden
//! - `/key` – Schluessel fuer andere Teilnehmer anzeigen
//! - `/quit` – Verbindung schliessen und beenden

use anyhow::{Context, Result};
use fluester_client::{
    format_file_size, Channel, ChannelEvent, ClientConfig, MessagePipeline, MimeClassifier,
    NotificationSink, Presentation,
};
use fluester_core::Schweregrad;
use fluester_crypto::CipherBox;
use fluester_observability::logging_initialisieren;
use fluester_protocol::{NachrichtenArt, WireMessage};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Gibt Nachrichten im Terminal aus
struct TerminalAnzeige;

impl Presentation for TerminalAnzeige {
    fn render_message(&self, _art: NachrichtenArt, nachricht: &WireMessage) {
        let absender = nachricht.absender().unwrap_or("?");
        match nachricht {
            WireMessage::TextMessage(n) => println!("[{absender}] {}", n.content),
            WireMessage::VoiceMessage(n) => {
                println!("[{absender}] Sprachnachricht ({:.1}s)", n.duration)
            }
            WireMessage::FileMessage(n) => println!(
                "[{absender}] Datei {} ({}, {})",
                n.file_name,
                n.file_type,
                format_file_size(n.file_size)
            ),
            _ => {}
        }
    }

    fn ereignis(&self, ereignis: &ChannelEvent) {
        match ereignis {
            ChannelEvent::UserId(id) => println!("* Du bist {id}"),
            ChannelEvent::UserCount(n) => println!("* {n} verbunden"),
            _ => {}
        }
    }
}

struct TerminalHinweise;

impl NotificationSink for TerminalHinweise {
    fn notify(&self, text: &str, schweregrad: Schweregrad) {
        eprintln!("[{schweregrad}] {text}");
    }
}

fn cipher_laden() -> Result<CipherBox> {
    let mut cipher = CipherBox::new();
    match std::env::var("FLUESTER_KEY") {
        Ok(schluessel) => cipher
            .import_key_base64(&schluessel)
            .context("FLUESTER_KEY ist kein gueltiger Schluessel")?,
        Err(_) => {
            cipher.generate_key()?;
            println!(
                "* Neuer Schluessel, fuer andere Teilnehmer als FLUESTER_KEY setzen:\n  {}",
                cipher.export_key()?
            );
        }
    }
    Ok(cipher)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad =
        std::env::var("FLUESTER_CLIENT_CONFIG").unwrap_or_else(|_| "client.toml".into());
    let datei_vorhanden = Path::new(&config_pfad).is_file();
    let mut config = ClientConfig::laden(&config_pfad)?;
    if let Some(origin) = std::env::args().nth(1) {
        config.origin = origin;
    }

    logging_initialisieren("warn", "text");
    if !datei_vorhanden {
        tracing::warn!(pfad = %config_pfad, "Konfigurationsdatei nicht gefunden, verwende Standardwerte");
    }

    let cipher = Arc::new(RwLock::new(cipher_laden()?));
    let channel = Channel::aus_config(&config, cipher)?;
    let pipeline = MessagePipeline::neu(
        channel.clone(),
        Arc::new(MimeClassifier::neu(
            config.dateien.max_groesse,
            config.dateien.max_anzahl,
        )),
        Arc::new(TerminalHinweise),
        &config.dateien,
    );
    let anzeige = pipeline.praesentation_starten(Arc::new(TerminalAnzeige));

    tracing::info!(url = %channel.url(), "Client startet");
    channel.connect();

    let mut zeilen = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let zeile = tokio::select! {
            zeile = zeilen.next_line() => zeile?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(zeile) = zeile else { break };

        match zeile.trim() {
            "/quit" => break,
            "/key" => println!("{}", pipeline.channel().cipher().read().export_key()?),
            befehl if befehl.starts_with("/file ") => {
                let pfad = befehl.trim_start_matches("/file ").trim();
                let gesendet = pipeline.send_file_paths(&[pfad]).await;
                tracing::debug!(gesendet, "Dateien gesendet");
            }
            text => {
                if let Err(e) = pipeline.send_text(text) {
                    eprintln!("Nicht gesendet: {e}");
                }
            }
        }
    }

    channel.disconnect().await;
    anzeige.abort();
    Ok(())
}
