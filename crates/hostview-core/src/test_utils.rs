//! Body collaborators for tests
//!
//! Enabled inside this crate's tests and, for downstream crates, through the
//! `test-utils` feature.

use crate::body::BodyReader;
use crate::error::BodyError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Body that counts how often it is read.
///
/// Each read sleeps briefly before answering, widening the window in which
/// concurrent readers could overlap. The first read returns the bytes; later
/// reads fail with [`BodyError::AlreadyConsumed`].
#[derive(Debug)]
pub struct CountingBody {
    bytes: Bytes,
    reads: AtomicUsize,
    delay: Duration,
}

impl CountingBody {
    /// Body yielding `bytes` once
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            reads: AtomicUsize::new(0),
            delay: Duration::from_millis(10),
        }
    }

    /// Change the per-read delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reads so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BodyReader for CountingBody {
    async fn read_to_end(&self, limit: usize) -> Result<Bytes, BodyError> {
        let previous = self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if previous > 0 {
            return Err(BodyError::AlreadyConsumed);
        }
        if self.bytes.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        Ok(self.bytes.clone())
    }
}

/// Body whose first reads fail with an I/O error
#[derive(Debug)]
pub struct FailingBody {
    failures_left: AtomicUsize,
    bytes: Bytes,
}

impl FailingBody {
    /// Body that never succeeds
    pub fn always() -> Self {
        Self::times(usize::MAX, Bytes::new())
    }

    /// Body that fails `failures` times, then yields `bytes`
    pub fn times(failures: usize, bytes: impl Into<Bytes>) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl BodyReader for FailingBody {
    async fn read_to_end(&self, _limit: usize) -> Result<Bytes, BodyError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
            return Err(BodyError::Read(Box::new(err)));
        }
        Ok(self.bytes.clone())
    }
}
