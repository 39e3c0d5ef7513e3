//! In-process upgrade host for tests
//!
//! [`MemoryUpgrade`] plays the part of a host that supports WebSockets
//! without any network: accepting spawns the handler on the server end of a
//! [`MemorySocket`] pair while the test drives the client end.
//!
//! ```rust,ignore
//! let env = Environment::new();
//! let mut client = MemoryUpgrade::install(&env);
//! let request = ServerRequest::new(env);
//!
//! let task = request.accept_websocket(|mut socket| async move {
//!     if let Some(Ok(msg)) = socket.recv().await {
//!         socket.send(msg).await?;
//!     }
//!     Ok(())
//! });
//!
//! client.send(Message::text("ping")).await?;
//! assert_eq!(client.next().await.unwrap()?, Message::text("ping"));
//! task.await?;
//! ```

use crate::capability::{spawn_processing, ProcessFn, UpgradeAccept};
use crate::{AcceptOptions, Message, WebSocketError};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, Sink, Stream};
use hostview_core::{keys, Environment};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// One end of an in-process message channel
#[derive(Debug)]
pub struct MemorySocket {
    tx: Option<mpsc::UnboundedSender<Message>>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl MemorySocket {
    /// Two connected ends
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self { tx: Some(a_tx), rx: a_rx },
            Self { tx: Some(b_tx), rx: b_rx },
        )
    }
}

impl Stream for MemorySocket {
    type Item = Result<Message, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|msg| msg.map(Ok))
    }
}

impl Sink<Message> for MemorySocket {
    type Error = WebSocketError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.tx.is_some() {
            Poll::Ready(Ok(()))
        } else {
            Poll::Ready(Err(WebSocketError::ConnectionClosed))
        }
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        let tx = self.tx.as_ref().ok_or(WebSocketError::ConnectionClosed)?;
        tx.send(item).map_err(|_| WebSocketError::ConnectionClosed)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.tx = None;
        Poll::Ready(Ok(()))
    }
}

/// Upgrade capability backed by a [`MemorySocket`] pair
#[derive(Debug)]
pub struct MemoryUpgrade {
    server: Mutex<Option<MemorySocket>>,
    options: Mutex<Option<AcceptOptions>>,
}

impl MemoryUpgrade {
    /// Capability plus the client end the test talks through
    pub fn with_client() -> (Self, MemorySocket) {
        let (server, client) = MemorySocket::pair();
        let upgrade = Self {
            server: Mutex::new(Some(server)),
            options: Mutex::new(None),
        };
        (upgrade, client)
    }

    /// Install a fresh capability into `env` and return the client end
    pub fn install(env: &Environment) -> MemorySocket {
        let (upgrade, client) = Self::with_client();
        let capability: Arc<dyn UpgradeAccept> = Arc::new(upgrade);
        env.insert(keys::WEBSOCKET_ACCEPT, capability);
        client
    }

    /// Options the last accept was called with
    pub fn accepted_options(&self) -> Option<AcceptOptions> {
        self.options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UpgradeAccept for MemoryUpgrade {
    fn accept(
        &self,
        options: AcceptOptions,
        process: ProcessFn,
    ) -> BoxFuture<'static, Result<(), WebSocketError>> {
        *self.options.lock().unwrap_or_else(PoisonError::into_inner) = Some(options);
        let server = self.server.lock().unwrap_or_else(PoisonError::into_inner).take();
        match server {
            Some(server) => spawn_processing(process(Box::new(server))),
            None => async {
                Err(WebSocketError::handshake_failed(
                    "memory socket already handed out",
                ))
            }
            .boxed(),
        }
    }
}
