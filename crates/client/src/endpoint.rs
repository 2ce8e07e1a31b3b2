//! Ableitung der WebSocket-URL aus einer HTTP-Herkunft

use crate::error::{ClientError, ClientResult};

/// Wandelt eine Herkunft (`http://host:port`) in die Relay-URL (`ws://host:port/`)
///
/// `https` wird zu `wss`. `ws://` und `wss://` werden unveraendert
/// uebernommen. Ein vorhandener Pfad wird durch `/` ersetzt.
pub fn websocket_url(origin: &str) -> ClientResult<String> {
    let origin = origin.trim();
    let (schema, rest) = origin
        .split_once("://")
        .ok_or_else(|| ClientError::Konfiguration(format!("Herkunft ohne Schema: {origin}")))?;

    let ws_schema = match schema.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        anderes => {
            return Err(ClientError::Konfiguration(format!(
                "Unbekanntes Schema: {anderes}"
            )))
        }
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ClientError::Konfiguration(format!(
            "Herkunft ohne Host: {origin}"
        )));
    }

    Ok(format!("{ws_schema}://{host}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_wird_ws() {
        assert_eq!(
            websocket_url("http://localhost:3000").unwrap(),
            "ws://localhost:3000/"
        );
    }

    #[test]
    fn https_wird_wss() {
        assert_eq!(
            websocket_url("https://chat.example.org/raum?x=1").unwrap(),
            "wss://chat.example.org/"
        );
    }

    #[test]
    fn ws_bleibt() {
        assert_eq!(websocket_url("ws://127.0.0.1:9/").unwrap(), "ws://127.0.0.1:9/");
        assert_eq!(websocket_url("WSS://host").unwrap(), "wss://host/");
    }

    #[test]
    fn ungueltige_herkunft() {
        assert!(websocket_url("localhost:3000").is_err());
        assert!(websocket_url("ftp://host").is_err());
        assert!(websocket_url("http://").is_err());
    }
}
