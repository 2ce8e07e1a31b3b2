//! Integrationstests fuer den Kanal gegen ein echtes Relay

use fluester_client::{Channel, ChannelEvent, GeteilteCipherBox, Phase, ReconnectPolicy};
use fluester_core::Schweregrad;
use fluester_crypto::CipherBox;
use fluester_protocol::WireMessage;
use fluester_relay::{RelayConfig, RelayServer};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WARTEZEIT: Duration = Duration::from_secs(5);

async fn relay_starten() -> (SocketAddr, watch::Sender<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(RelayServer::neu(RelayConfig::default()).starten(listener, shutdown_rx));
    (addr, shutdown_tx)
}

fn cipher_mit_schluessel() -> GeteilteCipherBox {
    let mut cb = CipherBox::new();
    cb.generate_key().unwrap();
    Arc::new(RwLock::new(cb))
}

fn kanal(addr: SocketAddr, cipher: GeteilteCipherBox) -> Channel {
    Channel::neu(format!("ws://{addr}/"), ReconnectPolicy::default(), 50, cipher)
}

async fn warte_auf<F>(rx: &mut broadcast::Receiver<ChannelEvent>, mut passt: F) -> ChannelEvent
where
    F: FnMut(&ChannelEvent) -> bool,
{
    loop {
        let ereignis = tokio::time::timeout(WARTEZEIT, rx.recv())
            .await
            .expect("Timeout beim Warten auf Ereignis")
            .expect("Ereignis-Bus geschlossen");
        if passt(&ereignis) {
            return ereignis;
        }
    }
}

/// Liest Textframes des Beobachters bis einer vom Typ `typ` kommt
async fn beobachten(ws: &mut Ws, typ: &str) -> Value {
    loop {
        let frame = tokio::time::timeout(WARTEZEIT, ws.next())
            .await
            .expect("Timeout beim Warten auf Frame")
            .expect("Stream beendet")
            .expect("WebSocket-Fehler");
        if let Message::Text(text) = frame {
            let wert: Value = serde_json::from_str(&text).unwrap();
            if wert["type"] == typ {
                return wert;
            }
        }
    }
}

#[tokio::test]
async fn warteschlange_wird_in_reihenfolge_nachgereicht() {
    let (addr, _shutdown) = relay_starten().await;
    let (mut beobachter, _) = connect_async(format!("ws://{addr}/")).await.unwrap();
    beobachten(&mut beobachter, "user_id").await;

    let kanal = kanal(addr, cipher_mit_schluessel());
    let mut rx = kanal.subscribe();

    for inhalt in ["eins", "zwei", "drei"] {
        kanal.send(&WireMessage::text(inhalt)).unwrap();
    }
    assert_eq!(kanal.queue_laenge(), 3);
    assert!(matches!(
        warte_auf(&mut rx, |e| matches!(e, ChannelEvent::Queued { .. })).await,
        ChannelEvent::Queued { wartend: 1 }
    ));

    kanal.connect();
    warte_auf(&mut rx, |e| *e == ChannelEvent::Connected).await;

    let mut empfangen = Vec::new();
    for _ in 0..3 {
        let wert = beobachten(&mut beobachter, "text_message").await;
        empfangen.push(wert["content"].as_str().unwrap().to_string());
    }
    assert_eq!(empfangen, vec!["eins", "zwei", "drei"]);
    assert_eq!(kanal.queue_laenge(), 0);

    kanal.disconnect().await;
}

#[tokio::test]
async fn wiederverbindung_gibt_nach_max_versuchen_auf() {
    // Port belegen und wieder freigeben: dort lauscht niemand mehr
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let kanal = Channel::neu(
        format!("ws://{addr}/"),
        ReconnectPolicy::neu(3, Duration::from_millis(10)),
        50,
        cipher_mit_schluessel(),
    );
    let mut rx = kanal.subscribe();
    kanal.connect();

    let mut verzoegerungen = Vec::new();
    loop {
        match warte_auf(&mut rx, |e| {
            matches!(
                e,
                ChannelEvent::ReconnectScheduled { .. } | ChannelEvent::ReconnectExhausted
            )
        })
        .await
        {
            ChannelEvent::ReconnectScheduled {
                versuch,
                verzoegerung,
            } => {
                assert_eq!(versuch as usize, verzoegerungen.len() + 1);
                verzoegerungen.push(verzoegerung.as_millis());
            }
            _ => break,
        }
    }

    assert_eq!(verzoegerungen, vec![10, 20, 40]);
    assert_eq!(kanal.phase(), Phase::Erschoepft);

    match warte_auf(&mut rx, |e| {
        matches!(
            e,
            ChannelEvent::Notice {
                schweregrad: Schweregrad::Error,
                ..
            }
        )
    })
    .await
    {
        ChannelEvent::Notice { text, .. } => assert!(text.contains("nach 3 Versuchen")),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn disconnect_verbindet_nicht_neu() {
    let (addr, _shutdown) = relay_starten().await;
    let (mut beobachter, _) = connect_async(format!("ws://{addr}/")).await.unwrap();
    beobachten(&mut beobachter, "user_id").await;

    let kanal = kanal(addr, cipher_mit_schluessel());
    let mut rx = kanal.subscribe();
    kanal.connect();
    warte_auf(&mut rx, |e| *e == ChannelEvent::Connected).await;

    kanal.disconnect().await;
    assert_eq!(kanal.phase(), Phase::Getrennt);
    assert!(matches!(
        warte_auf(&mut rx, |e| matches!(e, ChannelEvent::Disconnected { .. })).await,
        ChannelEvent::Disconnected { code: 1000 }
    ));

    // Relay meldet nur noch den Beobachter
    loop {
        let wert = beobachten(&mut beobachter, "user_count").await;
        if wert["count"] == 1 {
            break;
        }
    }

    let spaeter = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            match rx.recv().await {
                Ok(ChannelEvent::ReconnectScheduled { .. } | ChannelEvent::Connected) => {
                    return true
                }
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await;
    assert!(!matches!(spaeter, Ok(true)), "kein neuer Verbindungsversuch");
}

#[tokio::test]
async fn textnachricht_zwischen_zwei_kanaelen() {
    let (addr, _shutdown) = relay_starten().await;

    let cipher_a = cipher_mit_schluessel();
    let schluessel = cipher_a.read().export_key().unwrap();
    let mut cb = CipherBox::new();
    cb.import_key_base64(&schluessel).unwrap();
    let cipher_b = Arc::new(RwLock::new(cb));

    let a = kanal(addr, cipher_a.clone());
    let b = kanal(addr, cipher_b);
    let mut rx_a = a.subscribe();
    let mut rx_b = b.subscribe();

    a.connect();
    let id_a = match warte_auf(&mut rx_a, |e| matches!(e, ChannelEvent::UserId(_))).await {
        ChannelEvent::UserId(id) => id,
        _ => unreachable!(),
    };
    b.connect();
    warte_auf(&mut rx_b, |e| *e == ChannelEvent::Connected).await;
    warte_auf(&mut rx_a, |e| *e == ChannelEvent::UserCount(2)).await;

    let content = cipher_a.read().encrypt_to_string("geheim").unwrap();
    a.send(&WireMessage::text(content)).unwrap();

    match warte_auf(&mut rx_b, |e| matches!(e, ChannelEvent::Message(_))).await {
        ChannelEvent::Message(n) => {
            assert_eq!(n.content, "geheim");
            assert_eq!(n.user_id.as_deref(), Some(id_a.as_str()));
            assert!(n.timestamp.is_some());
        }
        _ => unreachable!(),
    }

    a.disconnect().await;
    b.disconnect().await;
}

fn verbindungsereignis(e: &ChannelEvent) -> bool {
    matches!(
        e,
        ChannelEvent::Connected
            | ChannelEvent::Disconnected { .. }
            | ChannelEvent::ReconnectScheduled { .. }
    )
}

#[tokio::test]
async fn abbruch_fuehrt_zu_wiederverbindung_mit_warteschlange() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gegenstelle = tokio::spawn(async move {
        // Erste Verbindung ohne Close-Frame fallen lassen
        let (tcp, _) = listener.accept().await.unwrap();
        drop(accept_async(tcp).await.unwrap());

        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let mut inhalte = Vec::new();
        while inhalte.len() < 3 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let wert: Value = serde_json::from_str(&text).unwrap();
                    inhalte.push(wert["content"].as_str().unwrap().to_string());
                }
                Some(Ok(_)) => {}
                _ => break,
            }
        }
        (inhalte, ws)
    });

    let kanal = Channel::neu(
        format!("ws://{addr}/"),
        ReconnectPolicy::neu(5, Duration::from_millis(300)),
        50,
        cipher_mit_schluessel(),
    );
    let mut rx = kanal.subscribe();
    kanal.connect();

    assert_eq!(warte_auf(&mut rx, verbindungsereignis).await, ChannelEvent::Connected);
    assert_eq!(
        warte_auf(&mut rx, verbindungsereignis).await,
        ChannelEvent::Disconnected { code: 1006 }
    );
    assert!(matches!(
        warte_auf(&mut rx, verbindungsereignis).await,
        ChannelEvent::ReconnectScheduled { versuch: 1, .. }
    ));

    // Waehrend der Wartezeit gesendet
    for inhalt in ["eins", "zwei", "drei"] {
        kanal.send(&WireMessage::text(inhalt)).unwrap();
    }
    assert_eq!(kanal.queue_laenge(), 3);

    assert_eq!(warte_auf(&mut rx, verbindungsereignis).await, ChannelEvent::Connected);
    let (inhalte, _ws) = tokio::time::timeout(WARTEZEIT, gegenstelle)
        .await
        .expect("Gegenstelle hat nicht alle Frames erhalten")
        .unwrap();
    assert_eq!(inhalte, vec!["eins", "zwei", "drei"]);
    assert_eq!(kanal.queue_laenge(), 0);

    kanal.disconnect().await;
}

#[tokio::test]
async fn close_code_entscheidet_ueber_wiederverbindung() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gegenstelle = tokio::spawn(async move {
        for code in [4000u16, 1001] {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            ws.send(Message::Close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: "Test".into(),
            })))
            .await
            .unwrap();
            // Bis der Client die Verbindung schliesst
            while let Some(Ok(_)) = ws.next().await {}
        }
    });

    let kanal = Channel::neu(
        format!("ws://{addr}/"),
        ReconnectPolicy::neu(5, Duration::from_millis(50)),
        50,
        cipher_mit_schluessel(),
    );
    let mut rx = kanal.subscribe();
    kanal.connect();

    let mut folge = Vec::new();
    while folge.len() < 5 {
        folge.push(warte_auf(&mut rx, verbindungsereignis).await);
    }
    assert_eq!(
        folge,
        vec![
            ChannelEvent::Connected,
            ChannelEvent::Disconnected { code: 4000 },
            ChannelEvent::ReconnectScheduled {
                versuch: 1,
                verzoegerung: Duration::from_millis(50),
            },
            ChannelEvent::Connected,
            ChannelEvent::Disconnected { code: 1001 },
        ]
    );

    // 1001 gilt als absichtlich: kein weiterer Versuch
    let weiterer = tokio::time::timeout(Duration::from_millis(300), async {
        loop {
            match rx.recv().await {
                Ok(e) if verbindungsereignis(&e) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    })
    .await;
    assert!(!matches!(weiterer, Ok(true)), "kein neuer Verbindungsversuch");
    assert_eq!(kanal.phase(), Phase::Getrennt);

    tokio::time::timeout(WARTEZEIT, gegenstelle)
        .await
        .expect("Gegenstelle nicht beendet")
        .unwrap();
}
