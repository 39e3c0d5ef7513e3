//! Duplex channel handed to WebSocket handlers

use crate::{Message, WebSocketError};
use futures_util::{
    stream::{SplitSink, SplitStream},
    Sink, SinkExt, Stream, StreamExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A host's raw duplex channel: a stream of incoming messages and a sink for
/// outgoing ones.
///
/// Implemented for every type with the right `Stream` and `Sink` shape;
/// hosts never implement it by hand.
pub trait RawSocket:
    Stream<Item = Result<Message, WebSocketError>>
    + Sink<Message, Error = WebSocketError>
    + Send
    + Unpin
{
}

impl<T> RawSocket for T where
    T: Stream<Item = Result<Message, WebSocketError>>
        + Sink<Message, Error = WebSocketError>
        + Send
        + Unpin
{
}

/// Type-erased [`RawSocket`]
pub type BoxedSocket = Box<dyn RawSocket>;

/// Upgraded connection given to a handler
///
/// # Example
///
/// ```rust,ignore
/// request.accept_websocket(|mut socket: WebSocket| async move {
///     while let Some(msg) = socket.recv().await {
///         match msg? {
///             Message::Text(text) => socket.send_text(format!("echo: {text}")).await?,
///             Message::Close(_) => break,
///             _ => {}
///         }
///     }
///     Ok(())
/// });
/// ```
pub struct WebSocket {
    inner: BoxedSocket,
}

impl WebSocket {
    /// Wrap a host channel
    pub fn new(socket: impl RawSocket + 'static) -> Self {
        Self {
            inner: Box::new(socket),
        }
    }

    pub(crate) fn from_boxed(inner: BoxedSocket) -> Self {
        Self { inner }
    }

    /// Send a message
    pub async fn send(&mut self, msg: Message) -> Result<(), WebSocketError> {
        self.inner.send(msg).await
    }

    /// Next incoming message, or `None` once the peer has gone
    pub async fn recv(&mut self) -> Option<Result<Message, WebSocketError>> {
        self.inner.next().await
    }

    /// Send a text message
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), WebSocketError> {
        self.send(Message::text(text)).await
    }

    /// Send a binary message
    pub async fn send_binary(&mut self, data: impl Into<Vec<u8>>) -> Result<(), WebSocketError> {
        self.send(Message::binary(data)).await
    }

    /// Send `value` as a JSON text message
    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), WebSocketError> {
        self.send(Message::json(value)?).await
    }

    /// Receive the next data message and decode it as JSON, skipping
    /// pings and pongs. `None` when the channel ends or a close arrives.
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> Option<Result<T, WebSocketError>> {
        loop {
            match self.recv().await? {
                Ok(msg) if msg.is_control() => continue,
                Ok(msg) if msg.is_close() => return None,
                Ok(msg) => return Some(msg.to_json()),
                Err(e) => return Some(Err(e)),
            }
        }
    }

    /// Send a close message and shut the channel
    pub async fn close(mut self) -> Result<(), WebSocketError> {
        self.inner.send(Message::close()).await?;
        self.inner.close().await
    }

    /// Split into independently usable halves
    pub fn split(self) -> (WebSocketSender, WebSocketReceiver) {
        let (sink, stream) = self.inner.split();
        (WebSocketSender { inner: sink }, WebSocketReceiver { inner: stream })
    }
}

impl Stream for WebSocket {
    type Item = Result<Message, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocket").finish_non_exhaustive()
    }
}

/// Sending half of a [`WebSocket`]
pub struct WebSocketSender {
    inner: SplitSink<BoxedSocket, Message>,
}

impl WebSocketSender {
    /// Send a message
    pub async fn send(&mut self, msg: Message) -> Result<(), WebSocketError> {
        self.inner.send(msg).await
    }

    /// Send a text message
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), WebSocketError> {
        self.send(Message::text(text)).await
    }

    /// Send a binary message
    pub async fn send_binary(&mut self, data: impl Into<Vec<u8>>) -> Result<(), WebSocketError> {
        self.send(Message::binary(data)).await
    }

    /// Send `value` as a JSON text message
    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), WebSocketError> {
        self.send(Message::json(value)?).await
    }

    /// Close the sending half
    pub async fn close(mut self) -> Result<(), WebSocketError> {
        self.inner.close().await
    }
}

/// Receiving half of a [`WebSocket`]
pub struct WebSocketReceiver {
    inner: SplitStream<BoxedSocket>,
}

impl WebSocketReceiver {
    /// Next incoming message
    pub async fn recv(&mut self) -> Option<Result<Message, WebSocketError>> {
        self.inner.next().await
    }
}

impl Stream for WebSocketReceiver {
    type Item = Result<Message, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySocket;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        seq: u32,
    }

    #[tokio::test]
    async fn send_and_receive_through_a_pair() {
        let (server, mut client) = MemorySocket::pair();
        let mut socket = WebSocket::new(server);

        socket.send_text("hello").await.unwrap();
        assert_eq!(client.next().await.unwrap().unwrap(), Message::text("hello"));

        client.send(Message::Ping(vec![1])).await.unwrap();
        client.send(Message::json(&Ping { seq: 7 }).unwrap()).await.unwrap();
        assert_eq!(socket.recv_json::<Ping>().await.unwrap().unwrap(), Ping { seq: 7 });
    }

    #[tokio::test]
    async fn split_halves_work_independently() {
        let (server, mut client) = MemorySocket::pair();
        let (mut tx, mut rx) = WebSocket::new(server).split();

        client.send(Message::binary(vec![1, 2, 3])).await.unwrap();
        let received = rx.recv().await.unwrap().unwrap();
        tx.send(received).await.unwrap();

        assert_eq!(client.next().await.unwrap().unwrap(), Message::binary(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn close_sends_a_close_message_then_ends() {
        let (server, mut client) = MemorySocket::pair();
        WebSocket::new(server).close().await.unwrap();

        assert!(client.next().await.unwrap().unwrap().is_close());
        assert!(client.next().await.is_none());
    }
}
