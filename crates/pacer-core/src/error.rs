//! # Error Module
//!
//! Error types for the policy engine.
//!
//! The taxonomy is deliberately small:
//! - [`PolicyError`] — programmer errors caught at construction time.
//! - [`ReplayError`] — malformed input to the replay engine.
//!
//! A suppressed or cancelled invocation is NOT an error: it simply never
//! executes and produces no result. Per-operation runtime failures in a
//! settlement batch are values (`SlotResult::Failed`), not error types,
//! and never propagate past their slot.

use crate::Tick;
use thiserror::Error;

/// Construction-time misuse of an adapter.
///
/// These fail fast when the gate is built, never at call time.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// A zero-length window would make every call fire unconditionally,
    /// which is always a caller bug rather than a policy.
    #[error("{what} must be at least one tick")]
    ZeroWindow {
        /// Which window parameter was zero ("debounce delay" or "throttle limit").
        what: &'static str,
    },
}

/// Malformed input to the timeline replay engine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    /// The call timeline must be sorted by tick.
    #[error("timeline is not sorted: call at tick {at} follows call at tick {prev}")]
    UnsortedTimeline {
        /// The earlier call's tick.
        prev: Tick,
        /// The out-of-order call's tick.
        at: Tick,
    },
}

// =============================================================================
// TESTS
// =============================================================================
