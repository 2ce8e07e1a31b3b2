//! Integrationstests fuer das Relay mit echten WebSocket-Verbindungen

use fluester_relay::{RelayConfig, RelayServer};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WARTEZEIT: Duration = Duration::from_secs(5);

async fn relay_starten() -> (SocketAddr, watch::Sender<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = RelayServer::neu(RelayConfig::default());
    tokio::spawn(server.starten(listener, shutdown_rx));
    (addr, shutdown_tx)
}

async fn naechstes_json(ws: &mut Ws) -> Value {
    loop {
        let frame = tokio::time::timeout(WARTEZEIT, ws.next())
            .await
            .expect("Timeout beim Warten auf Frame")
            .expect("Stream beendet")
            .expect("WebSocket-Fehler");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn warte_auf_typ(ws: &mut Ws, typ: &str) -> Value {
    loop {
        let wert = naechstes_json(ws).await;
        if wert["type"] == typ {
            return wert;
        }
    }
}

async fn warte_auf_anzahl(ws: &mut Ws, anzahl: u64) {
    loop {
        let wert = warte_auf_typ(ws, "user_count").await;
        if wert["count"] == anzahl {
            return;
        }
    }
}

/// Verbindet einen Peer und liefert seine zugewiesene ID
async fn verbinden(addr: SocketAddr) -> (Ws, String) {
    let (mut ws, _) = connect_async(format!("ws://{addr}/")).await.unwrap();
    let wert = naechstes_json(&mut ws).await;
    assert_eq!(wert["type"], "user_id", "erster Frame muss die ID sein");
    let id = wert["userId"].as_str().unwrap().to_string();
    (ws, id)
}

async fn still(ws: &mut Ws) -> bool {
    tokio::time::timeout(Duration::from_millis(300), ws.next())
        .await
        .is_err()
}

#[tokio::test]
async fn weiterleitung_an_alle_ausser_absender() {
    let (addr, _shutdown) = relay_starten().await;

    let (mut a, id_a) = verbinden(addr).await;
    let (mut b, _) = verbinden(addr).await;
    let (mut c, _) = verbinden(addr).await;
    for ws in [&mut a, &mut b, &mut c] {
        warte_auf_anzahl(ws, 3).await;
    }

    // Versuch, sich als jemand anderes auszugeben
    let frame = json!({"type": "text_message", "content": "AAAA", "userId": "Guest999"});
    a.send(Message::Text(frame.to_string())).await.unwrap();

    for ws in [&mut b, &mut c] {
        let wert = warte_auf_typ(ws, "text_message").await;
        assert_eq!(wert["content"], "AAAA");
        assert_eq!(wert["userId"], id_a.as_str());
        assert!(wert["timestamp"].as_u64().is_some());
    }
    assert!(still(&mut a).await, "Absender darf die eigene Nachricht nicht erhalten");
}

#[tokio::test]
async fn anzahl_sinkt_beim_trennen() {
    let (addr, _shutdown) = relay_starten().await;

    let mut peers = Vec::new();
    for _ in 0..4 {
        peers.push(verbinden(addr).await.0);
    }
    for ws in peers.iter_mut() {
        warte_auf_anzahl(ws, 4).await;
    }

    let mut letzter = peers.pop().unwrap();
    letzter.close(None).await.unwrap();

    for ws in peers.iter_mut() {
        warte_auf_anzahl(ws, 3).await;
    }
}

#[tokio::test]
async fn zu_grosser_frame_wird_verworfen() {
    let (addr, _shutdown) = relay_starten().await;

    let (mut a, _) = verbinden(addr).await;
    let (mut b, _) = verbinden(addr).await;
    warte_auf_anzahl(&mut a, 2).await;
    warte_auf_anzahl(&mut b, 2).await;

    let gross = json!({
        "type": "text_message",
        "content": "A".repeat(11 * 1024 * 1024),
    });
    a.send(Message::Text(gross.to_string())).await.unwrap();
    let klein = json!({"type": "text_message", "content": "danach"});
    a.send(Message::Text(klein.to_string())).await.unwrap();

    // Die Verbindung bleibt offen, nur die kleine Nachricht kommt an
    let wert = warte_auf_typ(&mut b, "text_message").await;
    assert_eq!(wert["content"], "danach");
}

#[tokio::test]
async fn ungueltiges_json_wird_ignoriert() {
    let (addr, _shutdown) = relay_starten().await;

    let (mut a, _) = verbinden(addr).await;
    let (mut b, _) = verbinden(addr).await;
    warte_auf_anzahl(&mut b, 2).await;

    a.send(Message::Text("{kaputt".into())).await.unwrap();
    a.send(Message::Text("[1,2,3]".into())).await.unwrap();
    a.send(Message::Text(json!({"type": "text_message", "content": "ok"}).to_string()))
        .await
        .unwrap();

    let wert = naechstes_json(&mut b).await;
    assert_eq!(wert["content"], "ok");
}

#[tokio::test]
async fn health_meldet_peers() {
    let (addr, _shutdown) = relay_starten().await;
    let (mut a, _) = verbinden(addr).await;
    warte_auf_anzahl(&mut a, 1).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut antwort = String::new();
    stream.read_to_string(&mut antwort).await.unwrap();

    assert!(antwort.starts_with("HTTP/1.1 200"));
    assert!(antwort.contains("\"status\":\"healthy\""));
    assert!(antwort.contains("\"peers\":1"));
}

#[tokio::test]
async fn shutdown_schliesst_mit_going_away() {
    let (addr, shutdown) = relay_starten().await;
    let (mut a, _) = verbinden(addr).await;
    warte_auf_anzahl(&mut a, 1).await;

    shutdown.send(true).unwrap();

    loop {
        let frame = tokio::time::timeout(WARTEZEIT, a.next())
            .await
            .expect("Timeout beim Warten auf Close")
            .expect("Stream beendet ohne Close")
            .unwrap();
        if let Message::Close(Some(close)) = frame {
            assert_eq!(u16::from(close.code), 1001);
            break;
        }
    }
}
