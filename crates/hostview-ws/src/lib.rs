//! # hostview-ws
//!
//! WebSocket upgrade bridge for [`hostview_core::ServerRequest`].
//!
//! Hosts advertise upgrade support by placing an [`UpgradeAccept`]
//! primitive in the request environment. Application code calls
//! [`AcceptWebSocket::accept_websocket`] with an async handler; the bridge
//! probes for the capability, hands the host an entry point, and reports
//! the outcome through an [`UpgradeTask`]. Hosts without the capability
//! produce [`WebSocketError::Unsupported`] rather than a panic.
//!
//! ## Features
//!
//! - **Capability probe**: [`Capability::Available`] / [`Capability::Unavailable`]
//! - **Channel**: [`WebSocket`] with send/receive helpers, JSON support and `split`
//! - **hyper host**: [`hyper_host`] validates handshakes, builds the 101
//!   response and drives `tokio-tungstenite` on the upgraded connection
//! - **In-memory host**: `memory` (feature `test-utils`) for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hostview_core::ServerRequest;
//! use hostview_ws::{AcceptWebSocket, Message};
//!
//! let task = request.accept_websocket(|mut socket| async move {
//!     while let Some(msg) = socket.recv().await {
//!         match msg? {
//!             Message::Text(text) => socket.send_text(format!("echo: {text}")).await?,
//!             Message::Close(_) => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! });
//! ```

// tungstenite errors are large; boxing them everywhere buys nothing here
#![allow(clippy::result_large_err)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod bridge;
mod capability;
mod error;
mod handler;
pub mod hyper_host;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
mod message;
mod socket;

pub use bridge::{AcceptWebSocket, UpgradeTask};
pub use capability::{AcceptOptions, Capability, ProcessFn, UpgradeAccept};
pub use error::WebSocketError;
pub use handler::SocketHandler;
pub use hyper_host::{HyperUpgrade, TungsteniteSocket};
pub use message::{close_code, CloseFrame, Message};
pub use socket::{BoxedSocket, RawSocket, WebSocket, WebSocketReceiver, WebSocketSender};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AcceptOptions, AcceptWebSocket, Capability, CloseFrame, Message, UpgradeTask, WebSocket,
        WebSocketError, WebSocketReceiver, WebSocketSender,
    };
}
