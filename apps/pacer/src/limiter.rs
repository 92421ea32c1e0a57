//! # Limiter Module
//!
//! Tokio-backed rate-limited call adapters.
//!
//! A [`Limiter`] wraps a caller-supplied function so that repeated
//! invocations are coalesced by a core gate (debounce or throttle). The
//! adapter owns a single worker task; the worker owns the gate, the
//! latest arguments (at most one pending invocation), and at most one
//! armed sleep. Every timer decision comes from the gate's verdicts —
//! this layer never invents timing of its own.
//!
//! Teardown discipline: dropping the handle (or calling
//! [`Limiter::shutdown`]) clears the pending timer, so no callback can
//! fire into a torn-down context. [`Limiter::cancel`] does the same
//! without stopping the adapter, and is idempotent.

use pacer_core::gate::{DebounceGate, Edge, Gate, ThrottleGate, Verdict};
use pacer_core::{PolicyError, Tick};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

// =============================================================================
// ERRORS
// =============================================================================

/// Failure to reach the adapter's worker task.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LimiterError {
    /// The worker task has stopped; the adapter is unusable.
    #[error("limiter worker is gone")]
    Closed,
}

// =============================================================================
// PUBLIC CONSTRUCTORS
// =============================================================================

/// Wrap `action` in a debounce adapter.
///
/// For a burst of calls spaced less than `delay` apart, `action` runs
/// exactly once: after the burst quiesces ([`Edge::Trailing`], with the
/// last call's arguments) or on the burst's first call
/// ([`Edge::Leading`]).
pub fn debounce<A, F>(delay: Duration, edge: Edge, action: F) -> Result<Limiter<A>, PolicyError>
where
    A: Send + 'static,
    F: FnMut(A) + Send + 'static,
{
    let gate = DebounceGate::new(duration_ticks(delay), edge)?;
    Ok(Limiter::spawn(gate, action))
}

/// Wrap `action` in a throttle adapter.
///
/// The first call runs immediately; further calls are suppressed for
/// `limit`. With `trailing`, the latest suppressed call runs once more
/// when the cooldown expires.
pub fn throttle<A, F>(limit: Duration, trailing: bool, action: F) -> Result<Limiter<A>, PolicyError>
where
    A: Send + 'static,
    F: FnMut(A) + Send + 'static,
{
    let gate = ThrottleGate::new(duration_ticks(limit), trailing)?;
    Ok(Limiter::spawn(gate, action))
}

/// Whole milliseconds of a `Duration`, as a gate tick.
fn duration_ticks(duration: Duration) -> Tick {
    Tick(duration.as_millis() as u64)
}

// =============================================================================
// LIMITER HANDLE
// =============================================================================

enum Command<A> {
    Call(A),
    Cancel,
}

/// Handle to a rate-limited call adapter.
///
/// Cheap to use from any task; all state lives in the worker. Dropping
/// the handle shuts the worker down and cancels any pending invocation.
#[derive(Debug)]
pub struct Limiter<A> {
    tx: mpsc::UnboundedSender<Command<A>>,
    worker: JoinHandle<()>,
}

impl<A: Send + 'static> Limiter<A> {
    fn spawn<G, F>(gate: G, action: F) -> Self
    where
        G: Gate + Send + 'static,
        F: FnMut(A) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(gate, action, rx));
        Self { tx, worker }
    }

    /// Submit an invocation with the given arguments.
    ///
    /// Whether and when the wrapped function actually runs is decided by
    /// the gate; this only fails if the worker is gone.
    pub fn call(&self, args: A) -> Result<(), LimiterError> {
        self.tx
            .send(Command::Call(args))
            .map_err(|_| LimiterError::Closed)
    }

    /// Cancel any pending invocation and clear the timer.
    ///
    /// Not an error path: a cancelled invocation simply never executes.
    /// Idempotent.
    pub fn cancel(&self) -> Result<(), LimiterError> {
        self.tx
            .send(Command::Cancel)
            .map_err(|_| LimiterError::Closed)
    }

    /// Stop the adapter, cancelling any pending invocation, and wait for
    /// the worker to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        // The worker exits on channel close; a join error here can only
        // mean it was already gone.
        let _ = self.worker.await;
    }
}

// =============================================================================
// WORKER
// =============================================================================

/// The adapter's event loop: one channel, one gate, one sleep.
async fn run_worker<A, G, F>(
    mut gate: G,
    mut action: F,
    mut rx: mpsc::UnboundedReceiver<Command<A>>,
) where
    G: Gate,
    F: FnMut(A),
{
    let start = Instant::now();
    // The single pending invocation's arguments.
    let mut latest: Option<A> = None;
    // The single armed timer.
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Call(args)) => {
                    latest = Some(args);
                    let now = elapsed_ticks(start);
                    let verdict = gate.submit(now);
                    trace!(now = now.0, fire = verdict.fire, "call submitted");
                    apply(verdict, start, &mut latest, &mut deadline, &mut action);
                }
                Some(Command::Cancel) => {
                    gate.cancel();
                    latest = None;
                    deadline = None;
                    debug!("pending invocation cancelled");
                }
                None => {
                    // Handle dropped: teardown clears the pending timer.
                    gate.cancel();
                    debug!("limiter torn down");
                    break;
                }
            },
            () = sleep_until(deadline), if deadline.is_some() => {
                deadline = None;
                let now = elapsed_ticks(start);
                let verdict = gate.expire(now);
                trace!(now = now.0, fire = verdict.fire, "timer expired");
                apply(verdict, start, &mut latest, &mut deadline, &mut action);
            }
        }
    }
}

/// Carry out a gate verdict: fire with the pending arguments and/or
/// replace the armed timer.
fn apply<A, F: FnMut(A)>(
    verdict: Verdict,
    start: Instant,
    latest: &mut Option<A>,
    deadline: &mut Option<Instant>,
    action: &mut F,
) {
    if verdict.fire {
        // Firing consumes the pending invocation.
        if let Some(args) = latest.take() {
            action(args);
        }
    }
    if let Some(at) = verdict.arm {
        *deadline = Some(start + Duration::from_millis(at.0));
    }
}

/// Sleep until the armed deadline; pending forever when there is none
/// (the select branch is disabled by its guard in that case).
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn elapsed_ticks(start: Instant) -> Tick {
    Tick(start.elapsed().as_millis() as u64)
}

// =============================================================================
// TESTS
// =============================================================================
