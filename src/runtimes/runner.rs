//! The per-turn run driver.
//!
//! [`ScenarioRunner`] is the runtime environment around compiled flows:
//! it owns the compile cache, the runtime configuration, and the
//! telemetry sinks, and exposes the one entry point callers use —
//! [`run_turn`](ScenarioRunner::run_turn).
//!
//! # Architecture: Scenario vs ScenarioRunner
//!
//! - **`Scenario`/`CompiledFlow`**: the graph structure and its
//!   executable form
//! - **`ScenarioRunner`**: the runtime environment (cache, config,
//!   telemetry)
//!
//! One runner serves any number of independent runs concurrently; the
//! only shared mutable state is the compile cache and the sink list,
//! both internally locked.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::graphs::{CompileCache, Scenario, ScenarioEdge, ScenarioNode};
use crate::message::Message;
use crate::state::{RunState, TraceEntry};
use crate::telemetry::{TurnEvent, TurnSink};
use crate::types::{Action, Awaiting};

use super::config::RuntimeConfig;
use super::resume::{self, Resolution};

/// Scenario id reported to telemetry when the caller supplies none.
const UNKNOWN_SCENARIO_ID: &str = "unknown";

/// One caller round-trip: the builder graph, the new input, and the
/// previous turn's state to continue from.
///
/// # Wire format
///
/// camelCase, all fields defaulted:
///
/// ```json
/// {
///   "scenarioId": "faq",
///   "nodes": [...],
///   "edges": [...],
///   "text": "hello",
///   "state": { ... previous RunState ... },
///   "action": {"type": "reply", "value": "cond_yes", "display": "Yes"}
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunRequest {
    /// Scenario identity, used only for telemetry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    /// Builder nodes.
    pub nodes: Vec<ScenarioNode>,
    /// Builder edges.
    pub edges: Vec<ScenarioEdge>,
    /// Raw user input for this turn (may be empty).
    pub text: String,
    /// Previous turn's state, replayed verbatim; absent on a fresh run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
    /// Resolution for a pending pause, if the user acted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

/// The engine's answer for one turn.
///
/// `messages`/`slots`/`vars`/`trace`/`awaiting` are convenience views of
/// the embedded `state`; `state` itself must be replayed verbatim on the
/// next call for the run to continue correctly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Run identity (assigned on the first turn).
    pub run_id: String,
    /// Full chat history of the run.
    pub messages: Vec<Message>,
    /// Collected slots.
    pub slots: rustc_hash::FxHashMap<String, Value>,
    /// Auxiliary variables.
    pub vars: rustc_hash::FxHashMap<String, Value>,
    /// Full execution trace of the run.
    pub trace: Vec<TraceEntry>,
    /// Pending pause, or `null` when the run is not suspended.
    pub awaiting: Option<Awaiting>,
    /// The state to replay on the next call.
    pub state: RunState,
}

/// Per-turn execution driver with compiled-flow caching and telemetry.
///
/// # Examples
///
/// ```
/// use chatweave::runtimes::{RunRequest, ScenarioRunner};
/// use chatweave::graphs::{NodeData, ScenarioNode};
/// use chatweave::types::NodeType;
///
/// let runner = ScenarioRunner::new();
/// let report = runner.run_turn(RunRequest {
///     nodes: vec![ScenarioNode {
///         id: "hi".into(),
///         node_type: NodeType::Message,
///         data: NodeData { content: "Hello!".into(), ..Default::default() },
///     }],
///     text: "hey".into(),
///     ..Default::default()
/// });
///
/// assert_eq!(report.messages.last().unwrap().content, "Hello!");
/// assert!(report.awaiting.is_none());
/// ```
pub struct ScenarioRunner {
    config: RuntimeConfig,
    cache: CompileCache,
    sinks: Mutex<Vec<Box<dyn TurnSink>>>,
}

impl ScenarioRunner {
    /// Creates a runner with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runner with explicit configuration.
    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let cache = CompileCache::with_capacity(config.cache_capacity);
        Self {
            config,
            cache,
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// The runner's configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The runner's compile cache.
    #[must_use]
    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }

    /// Attaches a telemetry sink. Every completed turn is offered to
    /// every attached sink, in attachment order.
    pub fn add_sink(&self, sink: impl TurnSink + 'static) {
        self.sinks.lock().push(Box::new(sink));
    }

    /// Executes one turn and returns the updated state.
    ///
    /// Per-call contract: increment the turn counter; record non-empty
    /// input as a user message; resolve a pending pause with the
    /// supplied action (a pause with no action leaves the run untouched);
    /// then chain node handlers until the run pauses again or reaches a
    /// terminal transition. The caller always receives a well-formed
    /// report — graph anomalies degrade into trace entries, never
    /// errors.
    pub fn run_turn(&self, req: RunRequest) -> RunReport {
        let RunRequest {
            scenario_id,
            nodes,
            edges,
            text,
            state,
            action,
        } = req;

        let scenario = Scenario::new(nodes, edges);
        let flow = self.cache.get_or_compile(&scenario);

        let mut state = state.unwrap_or_default();
        if state.run_id.is_empty() {
            state.run_id = Uuid::new_v4().to_string();
        }
        state.input_text = text;
        state.turn += 1;
        let trace_start = state.trace.len();

        let span = tracing::debug_span!("run_turn", run_id = %state.run_id, turn = state.turn);
        let _guard = span.enter();

        if !state.input_text.is_empty() {
            let mut meta = Map::new();
            meta.insert("source".to_string(), json!("input"));
            let content = state.input_text.clone();
            state.record_message(Message::USER, &content, meta);
        }

        let entry = match resume::apply_action(&mut state, action.as_ref()) {
            Resolution::StillPaused => None,
            Resolution::Resumed { next } => next,
            Resolution::NotPaused => flow.entry_for(&state),
        };
        if let Some(entry) = entry {
            flow.run(&mut state, &entry, self.config.max_steps_per_turn);
        }

        let event = TurnEvent::from_turn(
            &state,
            trace_start,
            scenario_id.as_deref().unwrap_or(UNKNOWN_SCENARIO_ID),
        );
        self.dispatch(&event);

        RunReport {
            run_id: state.run_id.clone(),
            messages: state.messages.clone(),
            slots: state.slots.clone(),
            vars: state.vars.clone(),
            trace: state.trace.clone(),
            awaiting: state.awaiting.clone(),
            state,
        }
    }

    /// Offers `event` to every sink; failures are logged, never raised.
    fn dispatch(&self, event: &TurnEvent) {
        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            if let Err(error) = sink.handle(event) {
                tracing::warn!(%error, "turn sink failed");
            }
        }
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}
