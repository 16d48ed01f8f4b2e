//! Compilation of a builder scenario into an executable flow.
//!
//! Compiling precomputes, per node, the outgoing edges and the default
//! next target, and designates the start node. The compiled form is
//! immutable and shared: the run driver executes it concurrently for any
//! number of independent runs.

use rustc_hash::FxHashMap;
use serde_json::{Map, json};

use super::scenario::{Scenario, ScenarioEdge, ScenarioNode};
use crate::handlers;
use crate::state::RunState;

/// One executable node: the builder node plus its precomputed topology.
#[derive(Clone, Debug)]
pub struct CompiledNode {
    /// The builder node as authored.
    pub node: ScenarioNode,
    /// Outgoing edges, in declaration order.
    pub outgoing: Vec<ScenarioEdge>,
    /// First outgoing edge's target; `None` when the node is terminal.
    pub default_next: Option<String>,
}

/// Executable form of a scenario.
///
/// Execution enters through the router rule ([`entry_for`]): a resuming
/// run continues at its cursor, a fresh run at the designated start node.
/// From there [`run`] chains node handlers within the turn — each handler
/// leaves its transition decision in the state's `next` field, which is
/// followed only if it names one of the node's declared outgoing targets
/// — until a handler pauses the run or yields the terminal sentinel.
///
/// [`entry_for`]: Self::entry_for
/// [`run`]: Self::run
#[derive(Clone, Debug)]
pub struct CompiledFlow {
    nodes: FxHashMap<String, CompiledNode>,
    start: Option<String>,
    fingerprint: u64,
}

impl CompiledFlow {
    /// Compiles a scenario. Deterministic: structurally identical
    /// scenarios compile to interchangeable flows.
    ///
    /// Compilation never fails; a malformed scenario degrades at run
    /// time instead (see [`Scenario::validate`] for the strict check).
    #[must_use]
    pub fn compile(scenario: &Scenario) -> Self {
        let start = scenario.start_node().map(str::to_string);
        let fingerprint = scenario.fingerprint();

        let mut nodes = FxHashMap::default();
        for node in &scenario.nodes {
            let outgoing: Vec<ScenarioEdge> = scenario.outgoing(&node.id).cloned().collect();
            let default_next = outgoing.first().map(|e| e.target.clone());
            nodes.insert(
                node.id.clone(),
                CompiledNode {
                    node: node.clone(),
                    outgoing,
                    default_next,
                },
            );
        }

        Self {
            nodes,
            start,
            fingerprint,
        }
    }

    /// The designated start node, if the scenario has any nodes.
    #[must_use]
    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    /// The content fingerprint of the compiled scenario (the cache key).
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Looks up a compiled node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&CompiledNode> {
        self.nodes.get(id)
    }

    /// Router rule: where a non-paused turn enters the graph — the
    /// resumption cursor when set, else the start node.
    #[must_use]
    pub fn entry_for(&self, state: &RunState) -> Option<String> {
        state.cursor.clone().or_else(|| self.start.clone())
    }

    /// Executes the flow from `entry`, chaining handlers within this
    /// turn until a pause, a terminal transition, or the per-turn step
    /// cutoff.
    ///
    /// The cutoff exists so a cyclic scenario cannot spin forever; when
    /// it fires, the cursor is already parked on the next unexecuted
    /// node, so the run resumes there on the following turn.
    pub fn run(&self, state: &mut RunState, entry: &str, max_steps: usize) {
        let mut current = entry.to_string();
        let mut steps: usize = 0;

        loop {
            let Some(compiled) = self.nodes.get(&current) else {
                tracing::warn!(target = %current, "transition to missing node; ending turn");
                state.record_trace(&current, "unknownTarget", Map::new());
                state.cursor = None;
                state.next = None;
                return;
            };

            if steps >= max_steps {
                tracing::warn!(steps, node = %current, "per-turn step limit reached; suspending chain");
                let mut info = Map::new();
                info.insert("steps".to_string(), json!(steps));
                state.record_trace(&current, "stepLimit", info);
                state.next = None;
                return;
            }
            steps += 1;

            tracing::debug!(node = %current, node_type = %compiled.node.node_type, "executing node");
            handlers::run_node(compiled, state);

            match state.next.take() {
                Some(target) if compiled.outgoing.iter().any(|e| e.target == target) => {
                    current = target;
                }
                Some(target) => {
                    tracing::warn!(
                        from = %compiled.node.id,
                        target = %target,
                        "transition target not among outgoing edges; ending turn"
                    );
                    let mut info = Map::new();
                    info.insert("target".to_string(), json!(target));
                    state.record_trace(&compiled.node.id, "invalidTransition", info);
                    state.cursor = None;
                    return;
                }
                None => return,
            }
        }
    }
}
