//! WebSocket-Transport
//!
//! Duenne Huelle um `tokio-tungstenite` mit getrennten Lese- und
//! Schreibhaelften fuer `tokio::select!`-Schleifen.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{ClientError, ClientResult};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Close-Code wenn die Gegenseite keinen mitschickt
pub const CLOSE_OHNE_CODE: u16 = 1005;

/// Empfangener Frame
#[derive(Debug)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
    Close { code: u16, reason: String },
}

/// Schreibhaelfte einer Verbindung
pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl WsWriter {
    /// Sendet einen Textframe
    pub async fn send_text(&mut self, text: String) -> ClientResult<()> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| ClientError::transport(format!("Senden fehlgeschlagen: {e}")))
    }

    /// Sendet einen Close-Frame mit Code und Grund
    pub async fn send_close(&mut self, code: u16, reason: &str) -> ClientResult<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.sink
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| ClientError::transport(format!("Close fehlgeschlagen: {e}")))
    }
}

/// Lesehaelfte einer Verbindung
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl WsReader {
    /// Naechster Frame, `None` wenn der Stream endet
    ///
    /// Ping/Pong beantwortet tungstenite selbst, sie werden uebersprungen.
    pub async fn recv(&mut self) -> Option<ClientResult<WsMessage>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(WsMessage::Text(text))),
                Ok(Message::Binary(data)) => return Some(Ok(WsMessage::Binary(data))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((CLOSE_OHNE_CODE, String::new()));
                    return Some(Ok(WsMessage::Close { code, reason }));
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => {
                    return Some(Err(ClientError::transport(format!("Lesefehler: {e}"))));
                }
            }
        }
    }
}

/// Baut die Verbindung auf und teilt sie in Schreib- und Lesehaelfte
pub async fn verbinden(url: &str) -> ClientResult<(WsWriter, WsReader)> {
    let (ws, _antwort) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| ClientError::transport(format!("Verbindung zu {url} fehlgeschlagen: {e}")))?;

    let (sink, stream) = ws.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}
