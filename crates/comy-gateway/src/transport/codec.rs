//! Decode-once codec for the transport layer.
//!
//! - Text frames => `ClientMessage` (or a malformed marker)
//! - Binary frames are not part of the protocol and count as malformed
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;

use comy_core::error::ComyError;
use comy_core::protocol::{self, ClientMessage};

#[derive(Debug)]
pub enum Inbound {
    Client(ClientMessage),
    Malformed(ComyError),
    TooLarge(usize),
    Ping(Vec<u8>),
    Pong,
    Close,
}

/// Size check runs before any parsing.
pub fn decode(msg: Message, max_frame_bytes: usize) -> Inbound {
    match msg {
        Message::Text(s) => {
            if s.len() > max_frame_bytes {
                return Inbound::TooLarge(s.len());
            }
            match protocol::decode(&s) {
                Ok(m) => Inbound::Client(m),
                Err(e) => Inbound::Malformed(e),
            }
        }
        Message::Binary(b) => {
            if b.len() > max_frame_bytes {
                return Inbound::TooLarge(b.len());
            }
            Inbound::Malformed(ComyError::BadRequest("binary frames are not supported".into()))
        }
        Message::Ping(v) => Inbound::Ping(v),
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_decode_or_are_marked_malformed() {
        let ok = decode(Message::Text(r#"{"type":"NeedState"}"#.into()), 1024);
        assert!(matches!(ok, Inbound::Client(ClientMessage::NeedState(_))));

        let bad = decode(Message::Text("{oops".into()), 1024);
        assert!(matches!(bad, Inbound::Malformed(ComyError::BadRequest(_))));
    }

    #[test]
    fn oversized_and_binary_frames() {
        let big = decode(Message::Text("x".repeat(300)), 256);
        assert!(matches!(big, Inbound::TooLarge(300)));

        let bin = decode(Message::Binary(vec![1, 2, 3]), 256);
        assert!(matches!(bin, Inbound::Malformed(_)));
    }
}
