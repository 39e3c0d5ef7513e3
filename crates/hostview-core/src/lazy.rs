//! Compute-once cells shared across threads
//!
//! A request view exposes several derived values (URL, headers, cookies...)
//! that are costly to build and may be read from many tasks at once. Each is
//! held in a [`Lazy`] cell, which publishes exactly one value for its whole
//! lifetime. How concurrent first readers are coordinated depends on the
//! strategy parameter:
//!
//! | strategy | first access | use for |
//! |---|---|---|
//! | [`Racy`] | every racer may compute a candidate; the first to publish wins, others drop theirs | pure factories |
//! | [`Serialized`] | racers queue on an async mutex; exactly one factory runs at a time | factories with side effects, such as draining a body |
//!
//! After publication both strategies read without locking.

use std::fmt;
use std::future::Future;
use std::sync::OnceLock;
use tokio::sync::Mutex;

mod private {
    pub trait Sealed {}
}

/// Publication strategy for a [`Lazy`] cell. Sealed.
pub trait PublishStrategy: private::Sealed + Default {}

/// Compare-and-publish: compute outside any lock, keep the first published
/// value.
#[derive(Debug, Default)]
pub struct Racy;

/// Lock-guarded: one factory at a time, failures publish nothing.
#[derive(Debug, Default)]
pub struct Serialized {
    gate: Mutex<()>,
}

impl private::Sealed for Racy {}
impl private::Sealed for Serialized {}
impl PublishStrategy for Racy {}
impl PublishStrategy for Serialized {}

/// A single-assignment cell parameterized by its [`PublishStrategy`]
pub struct Lazy<T, S: PublishStrategy = Racy> {
    cell: OnceLock<T>,
    strategy: S,
}

impl<T, S: PublishStrategy> Lazy<T, S> {
    /// Create an empty cell
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            strategy: S::default(),
        }
    }

    /// The published value, if any
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether a value has been published
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    fn publish(&self, candidate: T) -> &T {
        // A loser's candidate is dropped here; the winner is returned.
        self.cell.get_or_init(move || candidate)
    }
}

impl<T> Lazy<T, Racy> {
    /// Return the published value, computing and publishing one if needed.
    ///
    /// `init` runs without holding any lock and may run on several threads
    /// during a race; all of them get back the same published value.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        match self.cell.get() {
            Some(value) => value,
            None => self.publish(init()),
        }
    }

    /// Like [`get_or_init`](Self::get_or_init), but a failed `init` publishes
    /// nothing and returns the error.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        match self.cell.get() {
            Some(value) => Ok(value),
            None => Ok(self.publish(init()?)),
        }
    }
}

impl<T> Lazy<T, Serialized> {
    /// Return the published value, running `init` under this cell's lock if
    /// nothing is published yet.
    ///
    /// At most one `init` runs at a time. If it fails, the error is returned,
    /// the lock is released and the cell stays empty, so a later call retries.
    pub async fn get_or_try_init<F, Fut, E>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let _guard = self.strategy.gate.lock().await;
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let value = init().await?;
        Ok(self.publish(value))
    }
}

impl<T, S: PublishStrategy> Default for Lazy<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, S: PublishStrategy> fmt::Debug for Lazy<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => f.write_str("Lazy(<uninit>)"),
        }
    }
}
