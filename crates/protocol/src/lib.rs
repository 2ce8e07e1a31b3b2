//! fluester-protocol – Wire-Protokoll-Definitionen
//!
//! Alle Nachrichten zwischen Client und Relay sind JSON-Textframes ueber
//! eine WebSocket-Verbindung. Das Feld `type` bestimmt die Variante.
//!
//! | Richtung        | type            | Felder                                   |
//! |-----------------|-----------------|------------------------------------------|
//! | Server → Client | `user_id`       | `userId`                                 |
//! | Server → Client | `user_count`    | `count`                                  |
//! | beidseitig      | `text_message`  | `content` (+ `userId`, `timestamp`)      |
//! | beidseitig      | `voice_message` | `content`, `duration`                    |
//! | beidseitig      | `file_message`  | `content`, `fileName`, `fileType`, `fileSize` |

pub mod codec;
pub mod error;
pub mod wire;

pub use codec::{
    dekodieren, ist_absichtlicher_close, kodieren, stempeln, CLOSE_ABNORMAL, CLOSE_GOING_AWAY,
    CLOSE_NORMAL,
};
pub use error::{ProtocolError, ProtocolResult};
pub use wire::{DateiNachricht, NachrichtenArt, SprachNachricht, TextNachricht, WireMessage};
