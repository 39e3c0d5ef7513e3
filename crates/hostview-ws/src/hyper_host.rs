//! Upgrade capability for hyper servers
//!
//! A hyper service turns each incoming request into a request view with
//! [`environment`], which installs a [`HyperUpgrade`] capability when the
//! request is a valid WebSocket handshake. After
//! [`accept_websocket`](crate::AcceptWebSocket::accept_websocket) the
//! service returns [`switching_protocols`]; hyper completes the upgrade once
//! that response is written and the handler then runs on a spawned task.
//!
//! ```rust,ignore
//! async fn serve(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let view = ServerRequest::new(hyper_host::environment(req, None));
//!     // Not awaited: the channel only exists after the 101 is sent.
//!     let _task = view.accept_websocket(|mut socket| async move {
//!         while let Some(msg) = socket.recv().await {
//!             socket.send(msg?).await?;
//!         }
//!         Ok(())
//!     });
//!     Ok(hyper_host::switching_protocols(&view, &AcceptOptions::default())
//!         .unwrap_or_else(|e| bad_request(e)))
//! }
//! ```

use crate::capability::{spawn_processing, AcceptOptions, ProcessFn, UpgradeAccept};
use crate::{Message, WebSocketError};
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, Sink, Stream};
use hostview_core::{keys, BoxError, Environment, ServerRequest};
use http::{header, HeaderMap, Method, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Body;
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::{Role, WebSocketConfig};
use tokio_tungstenite::WebSocketStream;

const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Compute `Sec-WebSocket-Accept` for a client's `Sec-WebSocket-Key`
/// (RFC 6455 section 4.2.2)
pub fn generate_accept_key(key: &str) -> String {
    use base64::Engine;
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Check that a request is a WebSocket handshake and return its
/// `Sec-WebSocket-Key`
pub fn validate_upgrade_request(
    method: &Method,
    headers: &HeaderMap,
) -> Result<String, WebSocketError> {
    if method != Method::GET {
        return Err(WebSocketError::invalid_upgrade("Method must be GET"));
    }

    let upgrade = header_str(headers, header::UPGRADE.as_str())
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Upgrade header"))?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return Err(WebSocketError::invalid_upgrade("Upgrade header must be 'websocket'"));
    }

    let connection = header_str(headers, header::CONNECTION.as_str())
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Connection header"))?;
    if !has_token(connection, "upgrade") {
        return Err(WebSocketError::invalid_upgrade("Connection header must contain 'Upgrade'"));
    }

    let key = header_str(headers, "sec-websocket-key")
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Sec-WebSocket-Key header"))?;

    match header_str(headers, "sec-websocket-version") {
        Some("13") => Ok(key.to_owned()),
        Some(_) => Err(WebSocketError::invalid_upgrade("Sec-WebSocket-Version must be 13")),
        None => Err(WebSocketError::invalid_upgrade("Missing Sec-WebSocket-Version header")),
    }
}

/// Build the `101 Switching Protocols` response for an upgrade request.
///
/// The subprotocol from `options` is echoed only when the client offered it.
pub fn switching_protocols(
    request: &ServerRequest,
    options: &AcceptOptions,
) -> Result<Response<Full<Bytes>>, WebSocketError> {
    let key = request
        .header("Sec-WebSocket-Key")
        .ok_or_else(|| WebSocketError::invalid_upgrade("Missing Sec-WebSocket-Key header"))?;

    let mut response = Response::builder()
        .status(StatusCode::SWITCHING_PROTOCOLS)
        .header(header::UPGRADE, "websocket")
        .header(header::CONNECTION, "Upgrade")
        .header(header::SEC_WEBSOCKET_ACCEPT, generate_accept_key(key));

    if let Some(protocol) = &options.subprotocol {
        let offered = request
            .headers()
            .get_all("Sec-WebSocket-Protocol")
            .iter()
            .any(|list| has_token(list, protocol));
        if offered {
            response = response.header(header::SEC_WEBSOCKET_PROTOCOL, protocol.as_str());
        }
    }

    response
        .body(Full::new(Bytes::new()))
        .map_err(|e| WebSocketError::handshake_failed(e.to_string()))
}

/// Build an [`Environment`] from a hyper request, installing a
/// [`HyperUpgrade`] capability when the request is a WebSocket handshake
pub fn environment<B>(mut req: http::Request<B>, remote: Option<SocketAddr>) -> Environment
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    let upgrade = match validate_upgrade_request(req.method(), req.headers()) {
        Ok(_) => Some(hyper::upgrade::on(&mut req)),
        Err(reason) => {
            hostview_core::log_debug!(%reason, "not a websocket handshake");
            None
        }
    };

    let env = Environment::from_http_request(req, remote);
    if let Some(on_upgrade) = upgrade {
        let capability: Arc<dyn UpgradeAccept> = Arc::new(HyperUpgrade::new(on_upgrade));
        env.insert(keys::WEBSOCKET_ACCEPT, capability);
    }
    env
}

/// Upgrade capability over hyper's `OnUpgrade`
pub struct HyperUpgrade {
    on_upgrade: Mutex<Option<OnUpgrade>>,
}

impl HyperUpgrade {
    /// Wrap the upgrade future taken from a request
    pub fn new(on_upgrade: OnUpgrade) -> Self {
        Self {
            on_upgrade: Mutex::new(Some(on_upgrade)),
        }
    }
}

impl std::fmt::Debug for HyperUpgrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self
            .on_upgrade
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("HyperUpgrade").field("pending", &pending).finish()
    }
}

impl UpgradeAccept for HyperUpgrade {
    fn accept(
        &self,
        options: AcceptOptions,
        process: ProcessFn,
    ) -> BoxFuture<'static, Result<(), WebSocketError>> {
        let slot = self
            .on_upgrade
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(on_upgrade) = slot else {
            return async { Err(WebSocketError::handshake_failed("connection already upgraded")) }
                .boxed();
        };

        let mut config = WebSocketConfig::default();
        if let Some(limit) = options.max_message_size {
            config.max_message_size = Some(limit);
        }

        // hyper hands over the connection only after the 101 response is
        // written, so the rest must not depend on the caller awaiting.
        spawn_processing(async move {
            let upgraded = on_upgrade.await.map_err(|e| {
                hostview_core::log_error!(error = %e, "websocket upgrade failed");
                WebSocketError::handshake_failed(e.to_string())
            })?;
            let stream =
                WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, Some(config))
                    .await;
            process(Box::new(TungsteniteSocket::new(stream))).await
        })
    }
}

/// A `tokio-tungstenite` stream speaking [`Message`]
pub struct TungsteniteSocket<S> {
    inner: WebSocketStream<S>,
}

impl<S> TungsteniteSocket<S> {
    /// Wrap an established stream
    pub fn new(inner: WebSocketStream<S>) -> Self {
        Self { inner }
    }

    /// The wrapped stream
    pub fn into_inner(self) -> WebSocketStream<S> {
        self.inner
    }
}

impl<S> Stream for TungsteniteSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    type Item = Result<Message, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|item| item.map(|res| res.map(Message::from).map_err(WebSocketError::from)))
    }
}

impl<S> Sink<Message> for TungsteniteSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    type Error = WebSocketError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_ready(cx).map_err(WebSocketError::from)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        Pin::new(&mut self.inner)
            .start_send(item.into())
            .map_err(WebSocketError::from)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_flush(cx).map_err(WebSocketError::from)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner).poll_close(cx).map_err(WebSocketError::from)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn has_token(list: &str, token: &str) -> bool {
    list.split(',').any(|t| t.trim().eq_ignore_ascii_case(token))
}
