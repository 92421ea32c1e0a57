//! # Aggregate Module
//!
//! Parallel settlement of independent asynchronous operations.
//!
//! [`settle_all`] drives every operation concurrently on the calling
//! task (suspension happens only at each operation's own await points)
//! and waits for all of them to reach a terminal state. Output slot i
//! always corresponds to input slot i, regardless of which operation
//! finished first, and one slot's failure never aborts its siblings:
//! failures are captured into that slot's [`SlotResult`] and nothing
//! else. The whole batch settles at the latency of the slowest
//! operation, not the sum.
//!
//! Per-operation timeouts are deliberately out of scope: bounding an
//! operation's latency is the operation's own concern.

use futures::future::join_all;
use pacer_core::settle::SlotResult;
use std::future::Future;
use tracing::debug;

/// Settle an ordered batch of independent operations.
///
/// Futures are lazy, so each item is an operation that has not started
/// yet; all of them are started together here. An empty batch settles
/// immediately into an empty output (see DESIGN.md D2).
///
/// A panic inside an operation is a defect, not a per-slot failure, and
/// unwinds through the batch.
///
/// ```
/// use pacer::aggregate::settle_all;
/// use pacer_core::SlotResult;
///
/// async fn fetch(id: u32) -> Result<u32, String> {
///     if id == 2 { Err("e".to_string()) } else { Ok(id) }
/// }
///
/// # async fn demo() {
/// let slots = settle_all([fetch(1), fetch(2), fetch(3)]).await;
///
/// assert_eq!(slots[0], SlotResult::fulfilled(1));
/// assert_eq!(slots[1], SlotResult::failed("e".to_string()));
/// assert_eq!(slots[2], SlotResult::fulfilled(3));
/// # }
/// ```
pub async fn settle_all<T, E, Fut>(operations: impl IntoIterator<Item = Fut>) -> Vec<SlotResult<T, E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    let captured = operations
        .into_iter()
        .map(|operation| async move { SlotResult::from(operation.await) });

    let slots = join_all(captured).await;
    debug!(
        total = slots.len(),
        failed = slots.iter().filter(|slot| slot.is_failed()).count(),
        "batch settled"
    );
    slots
}

/// [`settle_all`] with a label carried alongside each slot.
///
/// Convenience for reporting surfaces (the CLI uses it); labels pass
/// through untouched and keep their input order.
pub async fn settle_all_named<T, E, Fut>(
    operations: Vec<(String, Fut)>,
) -> Vec<(String, SlotResult<T, E>)>
where
    Fut: Future<Output = Result<T, E>>,
{
    let (labels, futures): (Vec<_>, Vec<_>) = operations.into_iter().unzip();
    let slots = settle_all(futures).await;
    labels.into_iter().zip(slots).collect()
}

// =============================================================================
// TESTS
// =============================================================================
