//! # Settle Module
//!
//! Per-slot settlement results for parallel batches.
//!
//! A batch issues N independent operations and reports one result per
//! slot, in input order, regardless of completion order. A slot's
//! failure is a value, not an exception: it is captured in that slot and
//! never aborts its siblings. [`SlotResult`] is the tagged outcome —
//! by construction it holds exactly one of a value or an error, never
//! both and never neither.

use serde::{Deserialize, Serialize};

// =============================================================================
// SLOT RESULT
// =============================================================================

/// The terminal outcome of one slot in a settled batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SlotResult<T, E> {
    /// The operation produced a value.
    Fulfilled {
        /// The success value.
        value: T,
    },
    /// The operation failed; the error is confined to this slot.
    Failed {
        /// The captured failure value.
        error: E,
    },
}

impl<T, E> SlotResult<T, E> {
    /// Construct a fulfilled slot.
    #[must_use]
    pub fn fulfilled(value: T) -> Self {
        Self::Fulfilled { value }
    }

    /// Construct a failed slot.
    #[must_use]
    pub fn failed(error: E) -> Self {
        Self::Failed { error }
    }

    /// Check whether this slot settled successfully.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled { .. })
    }

    /// Check whether this slot failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The success value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fulfilled { value } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    /// The captured error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Fulfilled { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }

    /// Convert back into a plain `Result`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Fulfilled { value } => Ok(value),
            Self::Failed { error } => Err(error),
        }
    }
}

impl<T, E> From<Result<T, E>> for SlotResult<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Fulfilled { value },
            Err(error) => Self::Failed { error },
        }
    }
}

// =============================================================================
// BATCH STATISTICS
// =============================================================================

/// Integer summary of a settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of slots in the batch.
    pub total: usize,
    /// Slots that settled successfully.
    pub fulfilled: usize,
    /// Slots that failed.
    pub failed: usize,
}

impl BatchStats {
    /// Fulfilled share as an integer percentage (0-100).
    #[must_use]
    pub fn fulfilled_percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.fulfilled.saturating_mul(100)) / self.total) as u8
        }
    }
}

/// Summarize a slice of slot results.
#[must_use]
pub fn batch_stats<T, E>(slots: &[SlotResult<T, E>]) -> BatchStats {
    let fulfilled = slots.iter().filter(|slot| slot.is_fulfilled()).count();
    BatchStats {
        total: slots.len(),
        fulfilled,
        failed: slots.len() - fulfilled,
    }
}

// =============================================================================
// TESTS
// =============================================================================
