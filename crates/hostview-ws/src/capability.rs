//! Host upgrade capability

use crate::{BoxedSocket, WebSocketError};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use hostview_core::{keys, Environment};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Entry point the bridge hands to the host. The host calls it with its raw
/// channel once the handshake is done; the returned future runs the handler.
pub type ProcessFn =
    Box<dyn FnOnce(BoxedSocket) -> BoxFuture<'static, Result<(), WebSocketError>> + Send>;

/// Settings for one accepted upgrade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptOptions {
    /// Subprotocol to select, if the client offers it
    pub subprotocol: Option<String>,
    /// Largest message the host should accept, in bytes
    pub max_message_size: Option<usize>,
}

impl AcceptOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `protocol` when the client offers it
    pub fn subprotocol(mut self, protocol: impl Into<String>) -> Self {
        self.subprotocol = Some(protocol.into());
        self
    }

    /// Cap incoming message size
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }
}

/// A host's "accept and hand me a duplex channel" primitive.
///
/// Stored in the [`Environment`] under [`keys::WEBSOCKET_ACCEPT`] as an
/// `Arc<dyn UpgradeAccept>`. `accept` must not block. It completes the
/// handshake in whatever way the host does, calls `process` with the upgraded
/// channel, and returns a future resolving when `process` has finished.
pub trait UpgradeAccept: Send + Sync {
    /// Accept the upgrade and run `process` on the resulting channel
    fn accept(
        &self,
        options: AcceptOptions,
        process: ProcessFn,
    ) -> BoxFuture<'static, Result<(), WebSocketError>>;
}

/// Whether a host can upgrade a request
#[derive(Clone)]
pub enum Capability {
    /// The host supports upgrades through this primitive
    Available(Arc<dyn UpgradeAccept>),
    /// The host does not support upgrades
    Unavailable,
}

impl Capability {
    /// Look for an upgrade primitive in `env`
    pub fn probe(env: &Environment) -> Self {
        match env.get::<Arc<dyn UpgradeAccept>>(keys::WEBSOCKET_ACCEPT) {
            Some(accept) => Self::Available(Arc::clone(&*accept)),
            None => Self::Unavailable,
        }
    }

    /// Whether upgrades are possible
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Run a host's processing future on the current tokio runtime.
///
/// Processing proceeds whether or not the caller polls the returned future,
/// which only reports the outcome. Without a runtime nothing is spawned and
/// the returned future resolves to [`WebSocketError::HandshakeFailed`].
pub(crate) fn spawn_processing<F>(processing: F) -> BoxFuture<'static, Result<(), WebSocketError>>
where
    F: Future<Output = Result<(), WebSocketError>> + Send + 'static,
{
    let runtime = match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(err) => {
            hostview_core::log_error!(error = %err, "websocket processing needs a tokio runtime");
            let err = WebSocketError::handshake_failed(err.to_string());
            return futures_util::future::ready(Err(err)).boxed();
        }
    };

    let join = runtime.spawn(processing);
    async move {
        match join.await {
            Ok(result) => result,
            Err(join) if join.is_panic() => Err(WebSocketError::HandlerPanicked(join.to_string())),
            Err(join) => Err(WebSocketError::handshake_failed(join.to_string())),
        }
    }
    .boxed()
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Available"),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryUpgrade;

    #[test]
    fn probe_finds_installed_capability() {
        let env = Environment::new();
        assert!(!Capability::probe(&env).is_available());

        let _client = MemoryUpgrade::install(&env);
        assert!(Capability::probe(&env).is_available());
    }

    #[test]
    fn wrongly_typed_value_is_unavailable() {
        let env = Environment::new();
        env.insert(keys::WEBSOCKET_ACCEPT, "not a capability".to_string());
        assert!(matches!(Capability::probe(&env), Capability::Unavailable));
    }

    #[test]
    fn spawning_without_runtime_fails_through_the_future() {
        let outcome = spawn_processing(async { Ok(()) }).now_or_never();
        assert!(matches!(outcome, Some(Err(WebSocketError::HandshakeFailed(_)))));
    }

    #[tokio::test]
    async fn spawned_processing_runs_without_being_polled() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let outcome = spawn_processing(async move {
            done_tx.send(()).ok();
            Ok(())
        });
        done_rx.await.unwrap();
        assert!(outcome.await.is_ok());
    }

    #[test]
    fn options_builder() {
        let options = AcceptOptions::new().subprotocol("chat").max_message_size(1 << 16);
        assert_eq!(options.subprotocol.as_deref(), Some("chat"));
        assert_eq!(options.max_message_size, Some(65536));
    }
}
