//! # Gate Module
//!
//! The rate-limit state machines: debounce and throttle.
//!
//! Gates are pure and timer-free. A gate never schedules anything itself;
//! every transition returns a [`Verdict`] describing what the shell must
//! do with the adapter's single pending timer:
//!
//! - `submit(now)` — a caller invoked the wrapped function at `now`.
//! - `expire(now)` — the previously armed timer fired at `now`.
//! - `cancel()` — teardown; the pending invocation must never execute.
//!
//! Each gate instance owns at most one logical pending invocation at a
//! time. Arming a new deadline replaces the previous one, which is why
//! `Verdict::arm` is a replacement, not an addition.
//!
//! State machine (both variants):
//!
//! ```text
//! {Idle} --submit--> {Armed/Cooldown} --expire--> {Idle}
//! ```
//!
//! A call received while armed either resets the deadline (debounce) or
//! is suppressed / deferred (throttle).

use crate::error::PolicyError;
use crate::Tick;
use serde::{Deserialize, Serialize};

// =============================================================================
// VERDICT
// =============================================================================

/// Instruction to the shell after a gate transition.
///
/// `fire` means: invoke the wrapped function now, consuming the latest
/// recorded arguments. `arm` means: replace the single pending timer with
/// one at the given deadline (`None` leaves the timer as it is).
///
/// Both can be set at once: a leading-edge fire also opens its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Verdict {
    /// Invoke the wrapped function with the latest arguments.
    pub fire: bool,
    /// Replace the pending timer with one at this deadline.
    pub arm: Option<Tick>,
}

impl Verdict {
    /// Neither fire nor touch the timer.
    pub fn suppress() -> Self {
        Self {
            fire: false,
            arm: None,
        }
    }

    /// Fire immediately; leave the timer untouched.
    pub fn fire_now() -> Self {
        Self {
            fire: true,
            arm: None,
        }
    }

    /// Arm (or re-arm) the timer without firing.
    pub fn arm_at(deadline: Tick) -> Self {
        Self {
            fire: false,
            arm: Some(deadline),
        }
    }

    /// Fire immediately and arm the timer for the given deadline.
    pub fn fire_and_arm(deadline: Tick) -> Self {
        Self {
            fire: true,
            arm: Some(deadline),
        }
    }

    /// Check whether this verdict requires no action at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.fire && self.arm.is_none()
    }
}

// =============================================================================
// GATE TRAIT
// =============================================================================

/// The seam between the deterministic core and the async shell.
///
/// Both the tokio-backed adapter worker and the replay engine drive a
/// gate exclusively through this trait. Implementations must accept
/// non-decreasing `now` values and must tolerate a stale `expire` (one
/// delivered after `cancel`, or for a deadline that was since replaced)
/// by returning a no-op verdict.
pub trait Gate {
    /// A caller invoked the wrapped function at `now`.
    fn submit(&mut self, now: Tick) -> Verdict;

    /// The armed timer fired at `now`.
    ///
    /// Premature delivery (`now` before the armed deadline) is a no-op
    /// that keeps the gate's state; this makes stale timers harmless.
    fn expire(&mut self, now: Tick) -> Verdict;

    /// Clear any pending invocation so it never executes.
    ///
    /// Idempotent: cancelling twice equals cancelling once.
    fn cancel(&mut self);

    /// The currently armed deadline, if any.
    fn deadline(&self) -> Option<Tick>;

    /// Check whether an invocation or window is pending.
    fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }
}

// =============================================================================
// DEBOUNCE
// =============================================================================

/// Which edge of a call burst a debounce fires on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Fire once after the burst quiesces, with the last call's arguments.
    #[default]
    Trailing,
    /// Fire on the first call of a burst; suppress the rest, including
    /// the trailing call (see DESIGN.md D1).
    Leading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Armed { deadline: Tick },
}

/// Debounce: delay execution until a quiet period follows the last call.
///
/// For a burst of N calls spaced less than `delay` apart, exactly one
/// execution occurs:
///
/// - [`Edge::Trailing`]: at last-call-time + `delay`, with the last
///   call's arguments.
/// - [`Edge::Leading`]: at the first call, with the first call's
///   arguments; later calls extend the quiesce window but never fire.
///
/// A call arriving exactly `delay` after the previous one starts a new
/// burst (the window is half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceGate {
    delay: Tick,
    edge: Edge,
    state: DebounceState,
}

impl DebounceGate {
    /// Create a debounce gate.
    ///
    /// Fails fast with [`PolicyError::ZeroWindow`] for a zero delay.
    pub fn new(delay: Tick, edge: Edge) -> Result<Self, PolicyError> {
        if delay.is_zero() {
            return Err(PolicyError::ZeroWindow {
                what: "debounce delay",
            });
        }
        Ok(Self {
            delay,
            edge,
            state: DebounceState::Idle,
        })
    }

    /// The configured delay.
    #[must_use]
    pub fn delay(&self) -> Tick {
        self.delay
    }

    /// The configured edge.
    #[must_use]
    pub fn edge(&self) -> Edge {
        self.edge
    }
}

impl Gate for DebounceGate {
    fn submit(&mut self, now: Tick) -> Verdict {
        let next = now.saturating_add(self.delay);
        match (self.edge, self.state) {
            // Trailing: every call replaces the pending deadline.
            (Edge::Trailing, _) => {
                self.state = DebounceState::Armed { deadline: next };
                Verdict::arm_at(next)
            }
            // Leading, quiescent: fire now and open the window.
            (Edge::Leading, DebounceState::Idle) => {
                self.state = DebounceState::Armed { deadline: next };
                Verdict::fire_and_arm(next)
            }
            // Leading, window elapsed but expiry not yet delivered:
            // treat as a fresh burst.
            (Edge::Leading, DebounceState::Armed { deadline }) if now >= deadline => {
                self.state = DebounceState::Armed { deadline: next };
                Verdict::fire_and_arm(next)
            }
            // Leading, mid-burst: suppressed, window extended.
            (Edge::Leading, DebounceState::Armed { .. }) => {
                self.state = DebounceState::Armed { deadline: next };
                Verdict::arm_at(next)
            }
        }
    }

    fn expire(&mut self, now: Tick) -> Verdict {
        match self.state {
            DebounceState::Armed { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                match self.edge {
                    Edge::Trailing => Verdict::fire_now(),
                    Edge::Leading => Verdict::suppress(),
                }
            }
            // Premature or stale expiry.
            _ => Verdict::suppress(),
        }
    }

    fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }

    fn deadline(&self) -> Option<Tick> {
        match self.state {
            DebounceState::Armed { deadline } => Some(deadline),
            DebounceState::Idle => None,
        }
    }
}

// =============================================================================
// THROTTLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThrottleState {
    Idle,
    Cooldown { until: Tick, deferred: bool },
}

/// Throttle: limit execution to at most once per fixed window.
///
/// The first call fires immediately and opens a cooldown of `limit`.
/// Calls during the cooldown are suppressed; with `trailing` enabled the
/// latest suppressed call is remembered and fires once when the cooldown
/// expires, opening a fresh cooldown of its own. That keeps the bound at
/// one execution per window (two counting the leading edge).
///
/// `submit` is self-healing: a call arriving after the cooldown deadline
/// behaves as if the gate were idle, even when no expiry was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleGate {
    limit: Tick,
    trailing: bool,
    state: ThrottleState,
}

impl ThrottleGate {
    /// Create a throttle gate.
    ///
    /// Fails fast with [`PolicyError::ZeroWindow`] for a zero limit.
    pub fn new(limit: Tick, trailing: bool) -> Result<Self, PolicyError> {
        if limit.is_zero() {
            return Err(PolicyError::ZeroWindow {
                what: "throttle limit",
            });
        }
        Ok(Self {
            limit,
            trailing,
            state: ThrottleState::Idle,
        })
    }

    /// The configured window length.
    #[must_use]
    pub fn limit(&self) -> Tick {
        self.limit
    }

    /// Whether the trailing policy is enabled.
    #[must_use]
    pub fn trailing(&self) -> bool {
        self.trailing
    }

    /// Fire the leading edge and open a cooldown starting at `now`.
    fn open(&mut self, now: Tick) -> Verdict {
        let until = now.saturating_add(self.limit);
        self.state = ThrottleState::Cooldown {
            until,
            deferred: false,
        };
        Verdict::fire_and_arm(until)
    }
}

impl Gate for ThrottleGate {
    fn submit(&mut self, now: Tick) -> Verdict {
        match self.state {
            ThrottleState::Idle => self.open(now),
            ThrottleState::Cooldown { until, .. } if now >= until => self.open(now),
            ThrottleState::Cooldown { until, .. } => {
                if self.trailing {
                    // Remember that a deferred fire is owed; the caller
                    // keeps the latest arguments.
                    self.state = ThrottleState::Cooldown {
                        until,
                        deferred: true,
                    };
                }
                Verdict::suppress()
            }
        }
    }

    fn expire(&mut self, now: Tick) -> Verdict {
        match self.state {
            ThrottleState::Cooldown { until, deferred } if now >= until => {
                if deferred && self.trailing {
                    // Trailing fire opens its own window.
                    let next = now.saturating_add(self.limit);
                    self.state = ThrottleState::Cooldown {
                        until: next,
                        deferred: false,
                    };
                    Verdict::fire_and_arm(next)
                } else {
                    self.state = ThrottleState::Idle;
                    Verdict::suppress()
                }
            }
            // Premature or stale expiry.
            _ => Verdict::suppress(),
        }
    }

    fn cancel(&mut self) {
        self.state = ThrottleState::Idle;
    }

    fn deadline(&self) -> Option<Tick> {
        match self.state {
            ThrottleState::Cooldown { until, .. } => Some(until),
            ThrottleState::Idle => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn debounce(delay: u64, edge: Edge) -> DebounceGate {
        DebounceGate::new(Tick(delay), edge).expect("non-zero delay")
    }

    fn throttle(limit: u64, trailing: bool) -> ThrottleGate {
        ThrottleGate::new(Tick(limit), trailing).expect("non-zero limit")
    }

    // -------------------------------------------------------------------------
    // CONSTRUCTION
    // -------------------------------------------------------------------------

    #[test]
    fn zero_windows_are_rejected_at_construction() {
        assert_eq!(
            DebounceGate::new(Tick::ZERO, Edge::Trailing),
            Err(PolicyError::ZeroWindow {
                what: "debounce delay"
            })
        );
        assert_eq!(
            ThrottleGate::new(Tick::ZERO, false),
            Err(PolicyError::ZeroWindow {
                what: "throttle limit"
            })
        );
    }

    // -------------------------------------------------------------------------
    // DEBOUNCE, TRAILING EDGE
    // -------------------------------------------------------------------------

    #[test]
    fn trailing_debounce_rearms_on_every_call() {
        let mut gate = debounce(300, Edge::Trailing);

        assert_eq!(gate.submit(Tick(0)), Verdict::arm_at(Tick(300)));
        assert_eq!(gate.submit(Tick(100)), Verdict::arm_at(Tick(400)));
        assert_eq!(gate.submit(Tick(250)), Verdict::arm_at(Tick(550)));
        assert_eq!(gate.deadline(), Some(Tick(550)));

        // Quiesce: the timer fires once, then the gate is idle.
        assert_eq!(gate.expire(Tick(550)), Verdict::fire_now());
        assert!(!gate.is_pending());
    }

    #[test]
    fn trailing_debounce_ignores_premature_expiry() {
        let mut gate = debounce(300, Edge::Trailing);
        let _ = gate.submit(Tick(0));

        assert!(gate.expire(Tick(299)).is_noop());
        assert_eq!(gate.deadline(), Some(Tick(300)));
        assert_eq!(gate.expire(Tick(300)), Verdict::fire_now());
    }

    #[test]
    fn trailing_debounce_call_exactly_at_delay_is_a_new_burst() {
        let mut gate = debounce(300, Edge::Trailing);
        let _ = gate.submit(Tick(0));
        assert_eq!(gate.expire(Tick(300)), Verdict::fire_now());
        assert_eq!(gate.submit(Tick(300)), Verdict::arm_at(Tick(600)));
    }

    // -------------------------------------------------------------------------
    // DEBOUNCE, LEADING EDGE
    // -------------------------------------------------------------------------

    #[test]
    fn leading_debounce_fires_on_first_call_only() {
        let mut gate = debounce(300, Edge::Leading);

        assert_eq!(gate.submit(Tick(0)), Verdict::fire_and_arm(Tick(300)));
        // Mid-burst calls are suppressed and extend the window.
        assert_eq!(gate.submit(Tick(100)), Verdict::arm_at(Tick(400)));
        assert_eq!(gate.submit(Tick(250)), Verdict::arm_at(Tick(550)));
        // Window expiry fires nothing (the trailing call is suppressed).
        assert!(gate.expire(Tick(550)).is_noop());
        assert!(!gate.is_pending());
        // The next call starts a fresh burst.
        assert_eq!(gate.submit(Tick(900)), Verdict::fire_and_arm(Tick(1200)));
    }

    #[test]
    fn leading_debounce_self_heals_without_expiry() {
        let mut gate = debounce(300, Edge::Leading);
        let _ = gate.submit(Tick(0));
        // No expiry was delivered, but the window has long passed.
        assert_eq!(gate.submit(Tick(1000)), Verdict::fire_and_arm(Tick(1300)));
    }

    // -------------------------------------------------------------------------
    // THROTTLE
    // -------------------------------------------------------------------------

    #[test]
    fn throttle_leading_edge_example() {
        // throttle(f, 1000) called at t=0, 200, 1100 fires at 0 and 1100.
        let mut gate = throttle(1000, false);

        assert_eq!(gate.submit(Tick(0)), Verdict::fire_and_arm(Tick(1000)));
        assert!(gate.submit(Tick(200)).is_noop());
        assert!(gate.expire(Tick(1000)).is_noop());
        assert_eq!(gate.submit(Tick(1100)), Verdict::fire_and_arm(Tick(2100)));
    }

    #[test]
    fn throttle_calls_spaced_at_limit_all_fire() {
        let mut gate = throttle(100, false);
        for t in (0..500).step_by(100) {
            let verdict = gate.submit(Tick(t));
            assert!(verdict.fire, "call at t={t} should fire");
        }
    }

    #[test]
    fn throttle_trailing_fires_once_more_with_latest_arguments() {
        let mut gate = throttle(1000, true);

        assert!(gate.submit(Tick(0)).fire);
        assert!(gate.submit(Tick(200)).is_noop());
        assert!(gate.submit(Tick(400)).is_noop());

        // Cooldown expiry owes one trailing fire and opens a new window.
        assert_eq!(gate.expire(Tick(1000)), Verdict::fire_and_arm(Tick(2000)));
        // The new window owes nothing.
        assert!(gate.expire(Tick(2000)).is_noop());
        assert!(!gate.is_pending());
    }

    #[test]
    fn throttle_trailing_without_suppressed_calls_owes_nothing() {
        let mut gate = throttle(1000, true);
        assert!(gate.submit(Tick(0)).fire);
        assert!(gate.expire(Tick(1000)).is_noop());
    }

    #[test]
    fn throttle_self_heals_without_expiry() {
        let mut gate = throttle(1000, false);
        assert!(gate.submit(Tick(0)).fire);
        // No expiry delivered; the cooldown is simply over.
        assert!(gate.submit(Tick(2500)).fire);
    }

    // -------------------------------------------------------------------------
    // CANCELLATION
    // -------------------------------------------------------------------------

    #[test]
    fn cancel_clears_pending_invocation() {
        let mut gate = debounce(300, Edge::Trailing);
        let _ = gate.submit(Tick(0));
        assert!(gate.is_pending());

        gate.cancel();
        assert!(!gate.is_pending());
        // The stale timer fires nothing.
        assert!(gate.expire(Tick(300)).is_noop());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut gate = throttle(1000, true);
        let _ = gate.submit(Tick(0));
        let _ = gate.submit(Tick(100));

        gate.cancel();
        gate.cancel();
        assert!(!gate.is_pending());
        assert!(gate.expire(Tick(1000)).is_noop());
    }
}
