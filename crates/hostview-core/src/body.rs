//! Request body collaborators
//!
//! The view itself never touches sockets. When the form view needs the body
//! it asks the [`BodyReader`] the host placed in the environment. A body is
//! single-consumer: the first read drains it and later reads fail with
//! [`BodyError::AlreadyConsumed`].

use crate::error::{BodyError, BoxError};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of the raw request body
#[async_trait]
pub trait BodyReader: Send + Sync {
    /// Drain the body, failing if it is longer than `limit` bytes
    async fn read_to_end(&self, limit: usize) -> Result<Bytes, BodyError>;
}

#[async_trait]
impl<T: BodyReader + ?Sized> BodyReader for Arc<T> {
    async fn read_to_end(&self, limit: usize) -> Result<Bytes, BodyError> {
        (**self).read_to_end(limit).await
    }
}

/// A body already held in memory
///
/// ```rust,ignore
/// use hostview_core::{BodyError, BodyReader, BufferedBody};
///
/// let body = BufferedBody::new("a=1");
/// assert_eq!(body.read_to_end(1024).await?, "a=1");
/// assert!(matches!(body.read_to_end(1024).await, Err(BodyError::AlreadyConsumed)));
/// ```
#[derive(Debug)]
pub struct BufferedBody {
    bytes: Mutex<Option<Bytes>>,
}

impl BufferedBody {
    /// Wrap bytes as a body
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes.into())),
        }
    }
}

#[async_trait]
impl BodyReader for BufferedBody {
    async fn read_to_end(&self, limit: usize) -> Result<Bytes, BodyError> {
        let bytes = self
            .bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(BodyError::AlreadyConsumed)?;

        if bytes.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        Ok(bytes)
    }
}

/// Any `hyper` body, collected up to the limit on first read
pub struct HttpBody<B> {
    body: Mutex<Option<B>>,
}

impl<B> HttpBody<B> {
    /// Wrap a streaming body
    pub fn new(body: B) -> Self {
        Self {
            body: Mutex::new(Some(body)),
        }
    }
}

impl<B> std::fmt::Debug for HttpBody<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self
            .body
            .lock()
            .map(|b| b.is_some())
            .unwrap_or(false);
        f.debug_struct("HttpBody").field("pending", &pending).finish()
    }
}

#[async_trait]
impl<B> BodyReader for HttpBody<B>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    async fn read_to_end(&self, limit: usize) -> Result<Bytes, BodyError> {
        let body = self
            .body
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(BodyError::AlreadyConsumed)?;

        match Limited::new(body, limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(err) if err.is::<LengthLimitError>() => Err(BodyError::TooLarge { limit }),
            Err(err) => Err(BodyError::Read(err)),
        }
    }
}
