//! Adapting caller handlers to the host's entry point

use crate::capability::ProcessFn;
use crate::{BoxedSocket, WebSocket, WebSocketError};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use hostview_core::{UpgradePhase, UpgradeState};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

type BoxedHandler =
    Box<dyn FnOnce(WebSocket) -> BoxFuture<'static, Result<(), WebSocketError>> + Send>;

/// Wraps a caller's channel handler so that its outcome lands on the
/// request's [`UpgradeState`].
///
/// A handler error or panic moves the phase to `Failed`; a panic is reported
/// as [`WebSocketError::HandlerPanicked`] instead of unwinding into the host.
pub struct SocketHandler {
    handler: BoxedHandler,
    state: UpgradeState,
}

impl SocketHandler {
    /// Wrap `handler`, recording failures on `state`
    pub fn new<F, Fut>(state: UpgradeState, handler: F) -> Self
    where
        F: FnOnce(WebSocket) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), WebSocketError>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |socket| handler(socket).boxed()),
            state,
        }
    }

    /// Run the handler on `socket`
    pub async fn run(self, socket: BoxedSocket) -> Result<(), WebSocketError> {
        let Self { handler, state } = self;
        let outcome = AssertUnwindSafe(async move { handler(WebSocket::from_boxed(socket)).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(WebSocketError::HandlerPanicked(panic_message(&*panic))));

        if let Err(err) = &outcome {
            state.resolve(UpgradePhase::Failed);
            hostview_core::log_warn!(error = %err, "websocket handler failed");
        } else {
            hostview_core::log_debug!("websocket handler finished");
        }
        outcome
    }

    /// Host entry point running this handler
    pub fn into_process(self) -> ProcessFn {
        Box::new(move |socket| self.run(socket).boxed())
    }
}

impl std::fmt::Debug for SocketHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketHandler")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}
