//! # Pacer Core
//!
//! Deterministic policy engine for rate-limited call adapters.
//!
//! This crate is THE LOGIC: pure, synchronous, and timer-free. Timing
//! semantics are expressed over an integer logical clock ([`Tick`]), so
//! every policy decision is reproducible without a runtime or a wall
//! clock. The async shell (`apps/pacer`) binds these state machines to
//! real timers.
//!
//! ## Modules
//!
//! - [`gate`] — debounce / throttle state machines behind the [`gate::Gate`] trait
//! - [`replay`] — discrete-event replay of a call timeline through a gate
//! - [`settle`] — per-slot settlement results for parallel batches
//! - [`error`] — construction-time and replay error types

pub mod error;
pub mod gate;
pub mod replay;
pub mod settle;

pub use error::{PolicyError, ReplayError};
pub use gate::{DebounceGate, Edge, Gate, ThrottleGate, Verdict};
pub use replay::{Firing, replay};
pub use settle::{BatchStats, SlotResult, batch_stats};

use serde::{Deserialize, Serialize};

// =============================================================================
// LOGICAL TIME
// =============================================================================

/// Logical time in milliseconds.
///
/// The core never reads a wall clock. Callers supply `Tick` values
/// (monotone, non-decreasing per adapter instance) and the gates reason
/// purely in terms of them. The async shell derives ticks from elapsed
/// runtime time; tests and the replay engine use plain integers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    /// The zero tick.
    pub const ZERO: Tick = Tick(0);

    /// Saturating addition.
    #[must_use]
    pub fn saturating_add(self, rhs: Tick) -> Tick {
        Tick(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub fn saturating_sub(self, rhs: Tick) -> Tick {
        Tick(self.0.saturating_sub(rhs.0))
    }

    /// Check whether this is the zero tick.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Tick {
    fn from(ms: u64) -> Self {
        Tick(ms)
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
