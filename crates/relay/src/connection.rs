//! Peer-Verbindung – verarbeitet einen einzelnen WebSocket
//!
//! Jeder WebSocket bekommt einen eigenen tokio-Task. Die Schleife liest
//! eingehende Frames und schreibt gleichzeitig die Send-Queue des Peers
//! in den Socket.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use fluester_protocol::CLOSE_GOING_AWAY;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

use crate::relay::Relay;

/// Verarbeitet einen WebSocket bis zum Schliessen oder Shutdown
///
/// Beim Verlassen wird der Peer immer aus der Registry entfernt.
pub async fn verarbeiten(
    relay: Arc<Relay>,
    socket: WebSocket,
    peer_addr: SocketAddr,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let (session, mut sende_rx) = relay.peer_verbinden();
    let (mut sink, mut stream) = socket.split();

    tracing::debug!(peer = %session.display_id, adresse = %peer_addr, "WebSocket geoeffnet");

    loop {
        tokio::select! {
            // Eingehender Frame vom Peer
            eingehend = stream.next() => {
                match eingehend {
                    Some(Ok(Message::Text(text))) => {
                        relay.eingehend_verarbeiten(&session, &text);
                    }
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            relay.eingehend_verarbeiten(&session, &text);
                        }
                        Err(_) => {
                            tracing::warn!(peer = %session.display_id, "Binaerframe ohne UTF-8 verworfen");
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.as_ref().map(|f| f.code);
                        tracing::debug!(peer = %session.display_id, ?code, "Close-Frame empfangen");
                        break;
                    }
                    // Ping/Pong beantwortet axum selbst
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(peer = %session.display_id, fehler = %e, "WebSocket-Lesefehler");
                        break;
                    }
                    None => break,
                }
            }

            // Ausgehender Frame aus der Send-Queue
            ausgehend = sende_rx.recv() => {
                match ausgehend {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!(peer = %session.display_id, fehler = %e, "Senden fehlgeschlagen");
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Shutdown-Signal
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code: CLOSE_GOING_AWAY,
                            reason: "Server wird beendet".into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    }

    relay.peer_trennen(&session);
}
