//! # Chatweave: Graph-driven Conversational Scenario Engine
//!
//! Chatweave executes scenario graphs authored in a visual builder
//! (nodes + edges) as resumable, turn-based conversational state
//! machines. The full conversation state is serialized and handed back
//! to the caller between turns — there is no server-side session, and
//! durability is entirely the caller's concern.
//!
//! ## Core Concepts
//!
//! - **Scenario**: the builder graph, supplied fresh on every call
//! - **Compiled flow**: the executable form, shared through a bounded
//!   cache keyed by content fingerprint
//! - **Run state**: the single serialized aggregate a run lives in —
//!   slots, vars, messages, trace, cursor, and pause descriptor
//! - **Turn**: one caller round-trip, potentially chaining several
//!   nodes before pausing or ending
//! - **Awaiting**: a pause; the run suspends until the caller supplies
//!   a resolving action
//!
//! ## Quick Start
//!
//! ```
//! use chatweave::graphs::{NodeData, QuickReply, ScenarioEdge, ScenarioNode};
//! use chatweave::runtimes::{RunRequest, ScenarioRunner};
//! use chatweave::types::{Action, NodeType};
//!
//! // start --(message "Hi!")--> ask --(slotfilling name)--> bye
//! let nodes = vec![
//!     ScenarioNode {
//!         id: "hi".into(),
//!         node_type: NodeType::Message,
//!         data: NodeData { content: "Hi!".into(), ..Default::default() },
//!     },
//!     ScenarioNode {
//!         id: "ask".into(),
//!         node_type: NodeType::Slotfilling,
//!         data: NodeData {
//!             content: "Who are you?".into(),
//!             slot: Some("name".into()),
//!             replies: vec![QuickReply { value: None, display: Some("Sam".into()) }],
//!             ..Default::default()
//!         },
//!     },
//!     ScenarioNode {
//!         id: "bye".into(),
//!         node_type: NodeType::Message,
//!         data: NodeData { content: "Bye {{name}}!".into(), ..Default::default() },
//!     },
//! ];
//! let edges = vec![
//!     ScenarioEdge { source: "hi".into(), target: "ask".into(), source_handle: None },
//!     ScenarioEdge { source: "ask".into(), target: "bye".into(), source_handle: None },
//! ];
//!
//! let runner = ScenarioRunner::new();
//!
//! // Turn 1: greet, then pause at the slot prompt.
//! let report = runner.run_turn(RunRequest {
//!     nodes: nodes.clone(),
//!     edges: edges.clone(),
//!     text: "hello".into(),
//!     ..Default::default()
//! });
//! assert!(report.awaiting.is_some());
//!
//! // Turn 2: resolve the pause; the run finishes.
//! let report = runner.run_turn(RunRequest {
//!     nodes,
//!     edges,
//!     state: Some(report.state),
//!     action: Some(Action::reply("Sam")),
//!     ..Default::default()
//! });
//! assert!(report.awaiting.is_none());
//! assert_eq!(report.messages.last().unwrap().content, "Bye Sam!");
//! ```
//!
//! ## Error Handling
//!
//! Inside a turn the engine never fails: malformed graphs, unknown node
//! types, and unroutable choices degrade locally and surface only as
//! trace entries, so the caller always receives a well-formed report.
//! Strict structural checking is available upstream via
//! [`graphs::Scenario::validate`].
//!
//! ## Module Guide
//!
//! - [`message`] - Chat message type and construction utilities
//! - [`state`] - The serialized run state and its recorders
//! - [`types`] - Node types, pause descriptors, and caller actions
//! - [`template`] - `{{name}}` placeholder rendering
//! - [`graphs`] - Scenario definition, compilation, and caching
//! - [`runtimes`] - Pause resolution, configuration, and the run driver
//! - [`telemetry`] - Per-turn events, sinks, and statistics

pub mod graphs;
mod handlers;
pub mod message;
pub mod runtimes;
pub mod state;
pub mod telemetry;
pub mod template;
pub mod types;
