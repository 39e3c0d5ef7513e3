//! Per-request protocol upgrade state
//!
//! ```text
//! NotRequested ──begin──▶ Requested ──▶ Accepted ──▶ Failed
//!                              │
//!                              ├──────▶ Unsupported
//!                              └──────▶ Failed
//! ```
//!
//! The state lives on the request view so that the upgrade bridge, which is
//! a separate crate, can enforce "at most one upgrade per request".

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Phase of the upgrade handshake for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UpgradePhase {
    /// No upgrade attempted
    NotRequested = 0,
    /// An upgrade was requested and is being negotiated
    Requested = 1,
    /// The host accepted and the channel is being processed
    Accepted = 2,
    /// The host has no upgrade capability
    Unsupported = 3,
    /// The handshake or the channel processing failed
    Failed = 4,
}

impl UpgradePhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Requested,
            2 => Self::Accepted,
            3 => Self::Unsupported,
            4 => Self::Failed,
            _ => Self::NotRequested,
        }
    }

    /// Whether `self -> to` is a legal transition
    pub fn can_transition_to(self, to: UpgradePhase) -> bool {
        use UpgradePhase::*;
        matches!(
            (self, to),
            (NotRequested, Requested)
                | (Requested, Accepted)
                | (Requested, Unsupported)
                | (Requested, Failed)
                | (Accepted, Failed)
        )
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Unsupported | Self::Failed)
    }
}

impl fmt::Display for UpgradePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotRequested => "not requested",
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Unsupported => "unsupported",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shared, lock-free handle to a request's [`UpgradePhase`].
///
/// Clones observe the same state, so a spawned upgrade task can record the
/// outcome on the view it came from.
#[derive(Clone, Default)]
pub struct UpgradeState {
    phase: Arc<AtomicU8>,
}

impl UpgradeState {
    /// Fresh state in [`UpgradePhase::NotRequested`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    pub fn phase(&self) -> UpgradePhase {
        UpgradePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Claim the single upgrade slot.
    ///
    /// Moves `NotRequested -> Requested`. Any other starting phase means an
    /// upgrade was already attempted; that phase is returned as the error.
    pub fn begin(&self) -> Result<(), UpgradePhase> {
        self.phase
            .compare_exchange(
                UpgradePhase::NotRequested as u8,
                UpgradePhase::Requested as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(UpgradePhase::from_u8)
    }

    /// Move to `to` if that is a legal transition from the current phase.
    /// Returns whether the transition happened.
    pub fn resolve(&self, to: UpgradePhase) -> bool {
        self.phase
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                UpgradePhase::from_u8(raw)
                    .can_transition_to(to)
                    .then_some(to as u8)
            })
            .is_ok()
    }
}

impl fmt::Debug for UpgradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UpgradeState").field(&self.phase()).finish()
    }
}
