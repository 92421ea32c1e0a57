//! # CLI Module
//!
//! Command-line surface for Pacer.
//!
//! Two commands:
//! - `simulate` — replay a recorded call timeline through a rate-limit
//!   policy, deterministically, and report when the wrapped function
//!   would have run.
//! - `settle` — run a batch of mock asynchronous operations and settle
//!   every slot, demonstrating per-slot error isolation and input-order
//!   output.
//!
//! Command functions take parsed arguments and return the rendered
//! output, so integration tests drive them directly.

use crate::aggregate::settle_all_named;
use clap::{Parser, Subcommand, ValueEnum};
use pacer_core::gate::{DebounceGate, Edge, ThrottleGate};
use pacer_core::settle::{BatchStats, SlotResult, batch_stats};
use pacer_core::{Firing, PolicyError, ReplayError, Tick, replay};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Rate-limited call adapters and parallel settlement.
#[derive(Debug, Parser)]
#[command(name = "pacer", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a recorded call timeline through a rate-limit policy.
    ///
    /// The timeline file is a JSON array of call instants in
    /// milliseconds, sorted ascending, e.g. `[0, 100, 250]`.
    Simulate {
        /// Path to the timeline JSON file.
        timeline: PathBuf,

        /// Which policy to apply.
        #[arg(long, value_enum)]
        policy: Policy,

        /// Window length in milliseconds (debounce delay / throttle limit).
        #[arg(long)]
        window_ms: u64,

        /// Debounce only: which edge of a burst fires.
        #[arg(long, value_enum, default_value = "trailing")]
        edge: EdgeArg,

        /// Throttle only: fire the latest suppressed call at window end.
        #[arg(long)]
        trailing: bool,
    },

    /// Run a batch of mock operations and settle every slot.
    ///
    /// The batch file is a JSON array of slots, each with a `label`, an
    /// optional `delay_ms`, and exactly one of `value` or `error`.
    Settle {
        /// Path to the batch JSON file.
        batch: PathBuf,
    },
}

/// Rate-limit policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    Debounce,
    Throttle,
}

/// Clap-side mirror of [`Edge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EdgeArg {
    #[default]
    Trailing,
    Leading,
}

impl From<EdgeArg> for Edge {
    fn from(edge: EdgeArg) -> Self {
        match edge {
            EdgeArg::Trailing => Edge::Trailing,
            EdgeArg::Leading => Edge::Leading,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failures of the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The input file is not valid JSON of the expected shape.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// The offending path.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// Adapter construction was rejected.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The timeline was malformed.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// A batch slot carried both or neither of `value` / `error`.
    #[error("slot {label:?} must have exactly one of \"value\" or \"error\"")]
    AmbiguousSlot {
        /// The slot's label.
        label: String,
    },
}

// =============================================================================
// SIMULATE COMMAND
// =============================================================================

/// Replay output: the firings plus a one-line summary.
#[derive(Debug, Serialize)]
struct SimulateReport {
    calls: usize,
    firings: Vec<Firing>,
}

/// Replay a timeline file through the selected policy.
pub fn cmd_simulate(
    timeline: &Path,
    policy: Policy,
    window_ms: u64,
    edge: Edge,
    trailing: bool,
    json: bool,
) -> Result<String, CliError> {
    let instants: Vec<u64> = read_json(timeline)?;
    let calls: Vec<Tick> = instants.into_iter().map(Tick).collect();

    let firings = match policy {
        Policy::Debounce => {
            let mut gate = DebounceGate::new(Tick(window_ms), edge)?;
            replay(&mut gate, &calls)?
        }
        Policy::Throttle => {
            let mut gate = ThrottleGate::new(Tick(window_ms), trailing)?;
            replay(&mut gate, &calls)?
        }
    };

    info!(
        calls = calls.len(),
        firings = firings.len(),
        "timeline replayed"
    );

    let report = SimulateReport {
        calls: calls.len(),
        firings,
    };

    if json {
        return render_json(&report, timeline);
    }

    let mut output = String::new();
    for firing in &report.firings {
        output.push_str(&format!(
            "fired at t={} with call #{}'s arguments\n",
            firing.at, firing.call_index
        ));
    }
    output.push_str(&format!(
        "calls: {}, firings: {}\n",
        report.calls,
        report.firings.len()
    ));
    Ok(output)
}

// =============================================================================
// SETTLE COMMAND
// =============================================================================

/// One slot of the batch input file.
#[derive(Debug, Deserialize)]
struct SlotSpec {
    label: String,
    #[serde(default)]
    delay_ms: u64,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl SlotSpec {
    /// Exactly one of `value` / `error`, checked up front so a malformed
    /// slot fails the command instead of masquerading as a slot failure.
    fn into_outcome(self) -> Result<(String, u64, Result<serde_json::Value, String>), CliError> {
        match (self.value, self.error) {
            (Some(value), None) => Ok((self.label, self.delay_ms, Ok(value))),
            (None, Some(error)) => Ok((self.label, self.delay_ms, Err(error))),
            _ => Err(CliError::AmbiguousSlot { label: self.label }),
        }
    }
}

#[derive(Debug, Serialize)]
struct LabeledSlot {
    label: String,
    #[serde(flatten)]
    result: SlotResult<serde_json::Value, String>,
}

#[derive(Debug, Serialize)]
struct SettleReport {
    slots: Vec<LabeledSlot>,
    stats: BatchStats,
}

/// A mock operation: settle to the given outcome after a delay.
async fn mock_operation(
    delay_ms: u64,
    outcome: Result<serde_json::Value, String>,
) -> Result<serde_json::Value, String> {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    outcome
}

/// Run a batch file and settle every slot.
pub async fn cmd_settle(batch: &Path, json: bool) -> Result<String, CliError> {
    let specs: Vec<SlotSpec> = read_json(batch)?;

    let mut operations = Vec::with_capacity(specs.len());
    for spec in specs {
        let (label, delay_ms, outcome) = spec.into_outcome()?;
        operations.push((label, mock_operation(delay_ms, outcome)));
    }

    let settled = settle_all_named(operations).await;
    let slots: Vec<LabeledSlot> = settled
        .into_iter()
        .map(|(label, result)| LabeledSlot { label, result })
        .collect();
    let results: Vec<SlotResult<serde_json::Value, String>> =
        slots.iter().map(|slot| slot.result.clone()).collect();
    let stats = batch_stats(&results);

    info!(
        total = stats.total,
        failed = stats.failed,
        "batch settled"
    );

    let report = SettleReport { slots, stats };

    if json {
        return render_json(&report, batch);
    }

    let mut output = String::new();
    for (index, slot) in report.slots.iter().enumerate() {
        match &slot.result {
            SlotResult::Fulfilled { value } => {
                output.push_str(&format!("slot {index} [{}]: fulfilled: {value}\n", slot.label));
            }
            SlotResult::Failed { error } => {
                output.push_str(&format!("slot {index} [{}]: failed: {error}\n", slot.label));
            }
        }
    }
    output.push_str(&format!(
        "settled {} slots: {} fulfilled, {} failed ({}% ok)\n",
        report.stats.total,
        report.stats.fulfilled,
        report.stats.failed,
        report.stats.fulfilled_percent()
    ));
    Ok(output)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Read and parse a JSON input file.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a report as pretty JSON.
fn render_json<T: Serialize>(report: &T, path: &Path) -> Result<String, CliError> {
    serde_json::to_string_pretty(report).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}
