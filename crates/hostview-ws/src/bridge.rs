//! `accept_websocket` on request views

use crate::capability::{AcceptOptions, Capability};
use crate::handler::SocketHandler;
use crate::{WebSocket, WebSocketError};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use hostview_core::{ServerRequest, UpgradePhase};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Pending outcome of an upgrade.
///
/// Resolves once the handler has finished, or immediately when the upgrade
/// was refused. Dropping it stops waiting but does not cancel work the host
/// already started.
#[must_use = "an UpgradeTask reports handler failures only when awaited"]
pub struct UpgradeTask {
    inner: BoxFuture<'static, Result<(), WebSocketError>>,
}

impl UpgradeTask {
    fn ready(result: Result<(), WebSocketError>) -> Self {
        Self {
            inner: futures_util::future::ready(result).boxed(),
        }
    }
}

impl Future for UpgradeTask {
    type Output = Result<(), WebSocketError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for UpgradeTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeTask").finish_non_exhaustive()
    }
}

/// Upgrade a request to a WebSocket and run a handler on the channel.
///
/// Implemented for [`ServerRequest`]. The call never blocks and never
/// panics: every outcome, including "this host cannot upgrade", arrives
/// through the returned [`UpgradeTask`]. Only the first call per request
/// reaches the host; later calls resolve to
/// [`WebSocketError::AlreadyRequested`].
///
/// # Example
///
/// ```rust,ignore
/// use hostview_ws::{AcceptWebSocket, Message};
///
/// let task = request.accept_websocket(|mut socket| async move {
///     while let Some(msg) = socket.recv().await {
///         if let Message::Text(text) = msg? {
///             socket.send_text(text).await?;
///         }
///     }
///     Ok(())
/// });
/// ```
pub trait AcceptWebSocket {
    /// Upgrade with default [`AcceptOptions`]
    fn accept_websocket<F, Fut>(&self, handler: F) -> UpgradeTask
    where
        F: FnOnce(WebSocket) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), WebSocketError>> + Send + 'static,
    {
        self.accept_websocket_with(AcceptOptions::default(), handler)
    }

    /// Upgrade with explicit options
    fn accept_websocket_with<F, Fut>(&self, options: AcceptOptions, handler: F) -> UpgradeTask
    where
        F: FnOnce(WebSocket) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), WebSocketError>> + Send + 'static;
}

impl AcceptWebSocket for ServerRequest {
    fn accept_websocket_with<F, Fut>(&self, options: AcceptOptions, handler: F) -> UpgradeTask
    where
        F: FnOnce(WebSocket) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), WebSocketError>> + Send + 'static,
    {
        let state = self.upgrade_state().clone();
        if let Err(phase) = state.begin() {
            hostview_core::log_debug!(%phase, "websocket upgrade already requested");
            return UpgradeTask::ready(Err(WebSocketError::AlreadyRequested(phase)));
        }

        let accept = match Capability::probe(self.environment()) {
            Capability::Available(accept) => accept,
            Capability::Unavailable => {
                state.resolve(UpgradePhase::Unsupported);
                hostview_core::log_warn!("websocket upgrade requested but host cannot upgrade");
                return UpgradeTask::ready(Err(WebSocketError::Unsupported));
            }
        };

        let process = SocketHandler::new(state.clone(), handler).into_process();
        state.resolve(UpgradePhase::Accepted);
        hostview_core::log_debug!(
            subprotocol = options.subprotocol.as_deref(),
            "websocket upgrade accepted"
        );

        let pending = accept.accept(options, process);
        UpgradeTask {
            inner: async move {
                let result = pending.await;
                if let Err(err) = &result {
                    if state.resolve(UpgradePhase::Failed) {
                        hostview_core::log_error!(error = %err, "websocket upgrade failed");
                    }
                }
                result
            }
            .boxed(),
        }
    }
}
