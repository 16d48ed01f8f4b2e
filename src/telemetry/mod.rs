//! Turn telemetry: per-turn records, pluggable sinks, and aggregation.
//!
//! The engine produces one [`TurnEvent`] per run-driver invocation — run
//! identity, step count, pause status, slot snapshot, branch choices,
//! and an ended flag. Events are consumed through the [`TurnSink`] seam:
//! [`MemorySink`] for tests and dashboards, [`JsonlSink`] for the
//! append-only event log the statistics aggregation reads back. Sink
//! failures never fail a turn; the runner logs and moves on.
//!
//! See [`stats`] for folding a sequence of events into a per-scenario
//! summary.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::state::RunState;

pub mod stats;

/// One append-only telemetry record per turn.
///
/// Field semantics follow the engine's run state at the end of the turn:
/// `steps` counts the trace entries this turn appended,
/// `branch_picked` maps branch node ids to the choices resolved so far
/// in the run, and `ended` is true when nothing is awaited and no
/// cursor remains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnEvent {
    /// When the turn finished.
    #[serde(default = "Utc::now")]
    pub ts: DateTime<Utc>,
    /// Scenario identity supplied by the caller.
    pub scenario_id: String,
    /// Run identity.
    pub run_id: String,
    /// Turn counter at the end of the turn.
    pub turn: u64,
    /// Trace entries appended during this turn.
    pub steps: usize,
    /// Kind of the pending pause, if any (`"slot"` / `"branch"`).
    pub awaiting_kind: Option<String>,
    /// Node id of the pending pause, if any.
    pub awaiting_node_id: Option<String>,
    /// Snapshot of the collected slots.
    #[serde(default)]
    pub slots: FxHashMap<String, Value>,
    /// Branch node id → resolved choice value, cumulative over the run.
    #[serde(default)]
    pub branch_picked: FxHashMap<String, String>,
    /// True when the run reached a terminal transition with no pause.
    pub ended: bool,
    /// Node-type tag → number of executions this turn.
    #[serde(default)]
    pub executed_counts_by_type: FxHashMap<String, usize>,
}

impl TurnEvent {
    /// Builds the record for a finished turn.
    ///
    /// `trace_start` is the state's trace length before the turn ran;
    /// everything after it is "what happened this turn".
    #[must_use]
    pub fn from_turn(state: &RunState, trace_start: usize, scenario_id: &str) -> Self {
        let turn_trace = state.trace_since(trace_start);

        let mut executed_counts_by_type: FxHashMap<String, usize> = FxHashMap::default();
        for entry in turn_trace {
            *executed_counts_by_type
                .entry(entry.node_type.clone())
                .or_default() += 1;
        }

        // Branch choices accumulate over the whole run, so scan the full
        // trace rather than this turn's slice.
        let mut branch_picked: FxHashMap<String, String> = FxHashMap::default();
        for entry in &state.trace {
            if entry.node_type == "awaitingResolved"
                && entry.info.get("kind").and_then(Value::as_str) == Some("branch")
            {
                if let Some(value) = entry.info.get("value").and_then(Value::as_str) {
                    branch_picked.insert(entry.node_id.clone(), value.to_string());
                }
            }
        }

        Self {
            ts: Utc::now(),
            scenario_id: scenario_id.to_string(),
            run_id: state.run_id.clone(),
            turn: state.turn,
            steps: turn_trace.len(),
            awaiting_kind: state.awaiting.as_ref().map(|a| a.kind().to_string()),
            awaiting_node_id: state.awaiting.as_ref().map(|a| a.node_id().to_string()),
            slots: state.slots.clone(),
            branch_picked,
            ended: state.is_ended(),
            executed_counts_by_type,
        }
    }
}

/// Abstraction over an output target that consumes turn events.
pub trait TurnSink: Send + Sync {
    /// Handle one event. The sink decides how to serialize/format it.
    fn handle(&mut self, event: &TurnEvent) -> io::Result<()>;
}

/// In-memory sink for testing and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<TurnEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all captured events.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TurnEvent> {
        self.entries.lock().clone()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl TurnSink for MemorySink {
    fn handle(&mut self, event: &TurnEvent) -> io::Result<()> {
        self.entries.lock().push(event.clone());
        Ok(())
    }
}

/// Append-only JSONL sink, one event per line.
///
/// This is the consumer seam for durable run telemetry; the statistics
/// aggregation ([`stats::summarize`]) operates on the events written
/// here once read back.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl TurnSink for JsonlSink {
    fn handle(&mut self, event: &TurnEvent) -> io::Result<()> {
        let line = serde_json::to_string(event).map_err(io::Error::other)?;
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }
}

/// Installs a global tracing subscriber: env-filtered fmt output plus
/// span-trace capture for diagnostics. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_error::ErrorLayer::default())
        .try_init();
}
