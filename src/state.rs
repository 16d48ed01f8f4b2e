//! Run state for the chatweave scenario engine.
//!
//! A [`RunState`] is the single mutable aggregate threaded through one
//! turn of scenario execution. Between turns it is owned entirely by the
//! caller in serialized form; the engine has no server-side session. A
//! state replayed verbatim on the next call continues the run exactly
//! where it left off.
//!
//! # Recording
//!
//! The state doubles as the trace/message recorder: node handlers append
//! chat entries with [`RunState::record_message`] and execution-step
//! records with [`RunState::record_trace`]. Both sequences are
//! append-only; the engine never truncates them.
//!
//! # Examples
//!
//! ```rust
//! use chatweave::state::RunState;
//! use serde_json::Map;
//!
//! let mut state = RunState::default();
//! state.record_message("user", "hello", Map::new());
//! state.record_trace("n1", "message", Map::new());
//!
//! assert_eq!(state.messages.len(), 1);
//! assert_eq!(state.trace.len(), 1);
//! ```

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::Message;
use crate::types::Awaiting;

/// One execution-step record: which node ran, what kind it was, and any
/// node-specific detail (flattened onto the entry on the wire).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Timestamp the step was recorded.
    #[serde(default = "Utc::now")]
    pub ts: DateTime<Utc>,
    /// Id of the node (or pseudo-step such as `awaitingResolved`).
    pub node_id: String,
    /// Node type tag, or a pseudo-type for engine-level steps.
    pub node_type: String,
    /// Step-specific detail, flattened into the entry.
    #[serde(flatten)]
    pub info: Map<String, Value>,
}

/// The serialized conversation state for one scenario run.
///
/// Created empty on a run's first turn, reconstituted from the caller's
/// copy on every subsequent turn, and mutated only inside a single
/// run-driver invocation. All fields default, so a partial or empty JSON
/// object deserializes into a safely usable state.
///
/// # Wire format
///
/// camelCase throughout (`inputText`, `runId`, ...); `cursor`, `next` and
/// `awaiting` are omitted when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunState {
    /// Latest raw user input for this turn; overwritten each turn.
    pub input_text: String,
    /// Collected slot values, keyed by slot name.
    pub slots: FxHashMap<String, Value>,
    /// Auxiliary variables for display bookkeeping; not durable answers.
    pub vars: FxHashMap<String, Value>,
    /// Ordered chat history; append-only across the run's lifetime.
    pub messages: Vec<Message>,
    /// Ordered execution-step records; append-only.
    pub trace: Vec<TraceEntry>,
    /// Node id to resume execution at; `None` means start from the top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Transition target just computed by the executing handler; `None`
    /// is the terminal sentinel. Transient, overwritten every handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Pause descriptor; present iff the run awaits a caller action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<Awaiting>,
    /// Run identity, assigned on the first turn.
    pub run_id: String,
    /// Monotonically incrementing turn counter.
    pub turn: u64,
}

impl RunState {
    /// Appends an execution-step record to the trace.
    ///
    /// Always appends; never deduplicates. `info` carries step-specific
    /// detail and is flattened onto the entry when serialized.
    pub fn record_trace(&mut self, node_id: &str, node_type: &str, info: Map<String, Value>) {
        self.trace.push(TraceEntry {
            ts: Utc::now(),
            node_id: node_id.to_string(),
            node_type: node_type.to_string(),
            info,
        });
    }

    /// Appends a chat message to the history.
    pub fn record_message(&mut self, role: &str, content: &str, meta: Map<String, Value>) {
        self.messages.push(Message::new(role, content).with_meta(meta));
    }

    /// Returns true if the run is suspended waiting for a caller action.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Returns true if the run reached a terminal transition: nothing is
    /// awaited and there is no node to resume at.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.awaiting.is_none() && self.cursor.is_none()
    }

    /// The trace entries recorded since `start_len` — i.e. "what happened
    /// this turn" when `start_len` is the pre-turn trace length.
    #[must_use]
    pub fn trace_since(&self, start_len: usize) -> &[TraceEntry] {
        if start_len < self.trace.len() {
            &self.trace[start_len..]
        } else {
            &[]
        }
    }

    /// Creates a builder for constructing a `RunState` with fluent API,
    /// useful for tests and for seeding a resumed run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chatweave::state::RunState;
    /// use serde_json::json;
    ///
    /// let state = RunState::builder()
    ///     .with_slot("name", json!("Sam"))
    ///     .with_cursor("bye")
    ///     .build();
    /// assert_eq!(state.slots.get("name"), Some(&json!("Sam")));
    /// ```
    #[must_use]
    pub fn builder() -> RunStateBuilder {
        RunStateBuilder::default()
    }
}

/// Builder for constructing [`RunState`] values with fluent API.
#[derive(Debug, Default)]
pub struct RunStateBuilder {
    state: RunState,
}

impl RunStateBuilder {
    /// Sets a slot value.
    #[must_use]
    pub fn with_slot(mut self, name: &str, value: Value) -> Self {
        self.state.slots.insert(name.to_string(), value);
        self
    }

    /// Sets a variable.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: Value) -> Self {
        self.state.vars.insert(name.to_string(), value);
        self
    }

    /// Sets the resumption cursor.
    #[must_use]
    pub fn with_cursor(mut self, node_id: &str) -> Self {
        self.state.cursor = Some(node_id.to_string());
        self
    }

    /// Sets the pause descriptor.
    #[must_use]
    pub fn with_awaiting(mut self, awaiting: Awaiting) -> Self {
        self.state.awaiting = Some(awaiting);
        self
    }

    /// Sets the run identity.
    #[must_use]
    pub fn with_run_id(mut self, run_id: &str) -> Self {
        self.state.run_id = run_id.to_string();
        self
    }

    /// Sets the turn counter.
    #[must_use]
    pub fn with_turn(mut self, turn: u64) -> Self {
        self.state.turn = turn;
        self
    }

    /// Builds the final `RunState`.
    #[must_use]
    pub fn build(self) -> RunState {
        self.state
    }
}
