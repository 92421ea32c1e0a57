//! # Replay Module
//!
//! Discrete-event replay of a call timeline through a gate.
//!
//! Replay owns the virtual counterpart of the shell's single pending
//! timer: at most one deadline is outstanding, and arming a new one
//! replaces it. Events are delivered in tick order, with a timer expiry
//! at tick T delivered before a call at tick T.
//!
//! The output records every execution of the wrapped function: when it
//! ran and which call's arguments it consumed. This makes the timing
//! contracts checkable without any runtime, and it is what the CLI
//! `simulate` command prints.

use crate::error::ReplayError;
use crate::gate::{Gate, Verdict};
use crate::Tick;
use serde::{Deserialize, Serialize};

// =============================================================================
// FIRING
// =============================================================================

/// One execution of the wrapped function during a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    /// When the execution happened.
    pub at: Tick,
    /// Which call's arguments it consumed (index into the input timeline).
    pub call_index: usize,
}

// =============================================================================
// REPLAY ENGINE
// =============================================================================

/// Replay a sorted call timeline through a gate.
///
/// Returns the executions in chronological order. The timeline must be
/// sorted by tick (equal ticks are allowed); an unsorted timeline is a
/// caller bug and is rejected up front.
///
/// ```
/// use pacer_core::{replay, DebounceGate, Edge, Firing, Tick};
///
/// let mut gate = DebounceGate::new(Tick(300), Edge::Trailing)?;
/// let firings = replay(&mut gate, &[Tick(0), Tick(100), Tick(250)])?;
/// assert_eq!(firings, vec![Firing { at: Tick(550), call_index: 2 }]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn replay<G: Gate>(gate: &mut G, calls: &[Tick]) -> Result<Vec<Firing>, ReplayError> {
    for pair in calls.windows(2) {
        if pair[1] < pair[0] {
            return Err(ReplayError::UnsortedTimeline {
                prev: pair[0],
                at: pair[1],
            });
        }
    }

    let mut firings = Vec::new();
    // The single pending invocation: index of the latest submitted call.
    let mut latest: Option<usize> = None;
    // The single virtual timer.
    let mut pending: Option<Tick> = None;

    for (index, &at) in calls.iter().enumerate() {
        // Deliver every timer expiry due before (or at) this call.
        while let Some(deadline) = pending {
            if deadline > at {
                break;
            }
            pending = None;
            let verdict = gate.expire(deadline);
            apply(verdict, deadline, &mut latest, &mut pending, &mut firings);
        }

        latest = Some(index);
        let verdict = gate.submit(at);
        apply(verdict, at, &mut latest, &mut pending, &mut firings);
    }

    // Drain any timers outstanding after the last call.
    while let Some(deadline) = pending {
        pending = None;
        let verdict = gate.expire(deadline);
        apply(verdict, deadline, &mut latest, &mut pending, &mut firings);
    }

    Ok(firings)
}

/// Apply a verdict to the virtual timer and the firing log.
fn apply(
    verdict: Verdict,
    now: Tick,
    latest: &mut Option<usize>,
    pending: &mut Option<Tick>,
    firings: &mut Vec<Firing>,
) {
    if verdict.fire {
        // Firing consumes the pending invocation.
        if let Some(call_index) = latest.take() {
            firings.push(Firing {
                at: now,
                call_index,
            });
        }
    }
    if let Some(deadline) = verdict.arm {
        *pending = Some(deadline);
    }
}

// =============================================================================
// TESTS
// =============================================================================
