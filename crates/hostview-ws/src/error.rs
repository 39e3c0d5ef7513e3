//! Upgrade and channel failures

use hostview_core::UpgradePhase;
use thiserror::Error;

/// Failure of an upgrade attempt or of the channel it produced.
///
/// The first group of variants is reported before any handler runs; see
/// [`is_rejected`](Self::is_rejected). The rest come from a live channel.
#[derive(Error, Debug)]
pub enum WebSocketError {
    /// No upgrade capability in the request environment
    #[error("host cannot upgrade this request")]
    Unsupported,

    /// `accept_websocket` was already called for this request
    #[error("upgrade already requested, current phase is {0}")]
    AlreadyRequested(UpgradePhase),

    /// The request does not carry a usable WebSocket handshake
    #[error("not a websocket handshake: {0}")]
    InvalidUpgrade(String),

    /// The host accepted the upgrade but could not produce a channel
    #[error("handshake did not complete: {0}")]
    HandshakeFailed(String),

    /// The handler panicked; the message is the panic payload when it was a string
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    /// The peer closed the channel
    #[error("channel closed")]
    ConnectionClosed,

    /// A host channel reported a failure of its own
    #[error("channel error: {0}")]
    Channel(String),

    /// A ping, pong or close frame was asked for its JSON body
    #[error("control frames carry no JSON payload")]
    NotJson,

    /// JSON encoding or decoding of a message failed
    #[error("json message: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure below the protocol
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Protocol violation reported by tungstenite
    #[error("protocol error: {0}")]
    Protocol(#[source] tungstenite::Error),
}

impl WebSocketError {
    /// Handshake validation failure
    pub fn invalid_upgrade(reason: impl Into<String>) -> Self {
        Self::InvalidUpgrade(reason.into())
    }

    /// Host-side handshake failure
    pub fn handshake_failed(reason: impl Into<String>) -> Self {
        Self::HandshakeFailed(reason.into())
    }

    /// Host channel failure
    pub fn channel(reason: impl Into<String>) -> Self {
        Self::Channel(reason.into())
    }

    /// Whether the upgrade was refused before a handler could run
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::Unsupported | Self::AlreadyRequested(_) | Self::InvalidUpgrade(_)
        )
    }
}

impl From<tungstenite::Error> for WebSocketError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::ConnectionClosed
            }
            tungstenite::Error::Io(io) => Self::Io(io),
            other => Self::Protocol(other),
        }
    }
}
