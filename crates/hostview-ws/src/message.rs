//! Messages exchanged over an upgraded channel

use crate::WebSocketError;
use serde::{de::DeserializeOwned, Serialize};
use std::borrow::Cow;
use tungstenite::protocol::frame::coding::CloseCode as WireCloseCode;

/// Standard close codes (RFC 6455 section 7.4.1)
pub mod close_code {
    /// Normal closure
    pub const NORMAL: u16 = 1000;
    /// Endpoint is going away
    pub const AWAY: u16 = 1001;
    /// Protocol error
    pub const PROTOCOL: u16 = 1002;
    /// Data type the endpoint cannot accept
    pub const UNSUPPORTED: u16 = 1003;
    /// Message violates policy
    pub const POLICY: u16 = 1008;
    /// Message too big to process
    pub const SIZE: u16 = 1009;
    /// Unexpected server condition
    pub const ERROR: u16 = 1011;
}

/// A WebSocket message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Ping with payload
    Ping(Vec<u8>),
    /// Pong with payload
    Pong(Vec<u8>),
    /// Close, with an optional code and reason
    Close(Option<CloseFrame>),
}

/// Code and reason carried by a close message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// Close code, see [`close_code`]
    pub code: u16,
    /// Human-readable reason
    pub reason: String,
}

impl CloseFrame {
    /// Create a close frame
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl Message {
    /// Text message
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Binary message
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::Binary(data.into())
    }

    /// Close message without a frame
    pub fn close() -> Self {
        Self::Close(None)
    }

    /// Close message with a code and reason
    pub fn close_with(code: u16, reason: impl Into<String>) -> Self {
        Self::Close(Some(CloseFrame::new(code, reason)))
    }

    /// Serialize `value` as a JSON text message
    pub fn json<T: Serialize>(value: &T) -> Result<Self, WebSocketError> {
        Ok(Self::Text(serde_json::to_string(value)?))
    }

    /// Deserialize a text or binary message as JSON
    pub fn to_json<T: DeserializeOwned>(&self) -> Result<T, WebSocketError> {
        let parsed = match self {
            Self::Text(text) => serde_json::from_str(text),
            Self::Binary(data) => serde_json::from_slice(data),
            _ => return Err(WebSocketError::NotJson),
        };
        Ok(parsed?)
    }

    /// Text content, if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Payload bytes of any data or control message
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) | Self::Ping(data) | Self::Pong(data) => data,
            Self::Close(_) => &[],
        }
    }

    /// Whether this is a close message
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close(_))
    }

    /// Whether this is a ping or pong
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Ping(_) | Self::Pong(_))
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

impl From<tungstenite::Message> for Message {
    fn from(msg: tungstenite::Message) -> Self {
        match msg {
            tungstenite::Message::Text(text) => Self::Text(text),
            tungstenite::Message::Binary(data) => Self::Binary(data),
            tungstenite::Message::Ping(data) => Self::Ping(data),
            tungstenite::Message::Pong(data) => Self::Pong(data),
            tungstenite::Message::Close(frame) => Self::Close(frame.map(|f| CloseFrame {
                code: u16::from(f.code),
                reason: f.reason.into_owned(),
            })),
            // Raw frames only surface when reading in frame mode
            tungstenite::Message::Frame(_) => Self::Binary(Vec::new()),
        }
    }
}

impl From<Message> for tungstenite::Message {
    fn from(msg: Message) -> Self {
        match msg {
            Message::Text(text) => Self::Text(text),
            Message::Binary(data) => Self::Binary(data),
            Message::Ping(data) => Self::Ping(data),
            Message::Pong(data) => Self::Pong(data),
            Message::Close(frame) => {
                Self::Close(frame.map(|f| tungstenite::protocol::CloseFrame {
                    code: WireCloseCode::from(f.code),
                    reason: Cow::Owned(f.reason),
                }))
            }
        }
    }
}
