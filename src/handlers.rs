//! Per-node-type execution logic.
//!
//! One handler per [`NodeType`] variant, dispatched exhaustively. Every
//! handler works the same way: read the node's payload and precomputed
//! outgoing edges, write messages/trace through the run-state recorder,
//! then leave the transition decision in `state.next` (`None` is the
//! terminal sentinel) and the resumption point in `state.cursor`.
//! Handlers have no I/O of their own and retain nothing beyond the call.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value, json};

use crate::graphs::CompiledNode;
use crate::state::RunState;
use crate::template;
use crate::types::{Awaiting, NodeType};

/// Executes one node against the run state.
pub(crate) fn run_node(compiled: &CompiledNode, state: &mut RunState) {
    match &compiled.node.node_type {
        NodeType::Message => handle_message(compiled, state),
        NodeType::Slotfilling => handle_slotfilling(compiled, state),
        NodeType::Branch => handle_branch(compiled, state),
        NodeType::Unknown(tag) => handle_unknown(&compiled.node.id, tag, state),
    }
}

/// `message`: render the content template, emit it, advance.
fn handle_message(compiled: &CompiledNode, state: &mut RunState) {
    let node_id = &compiled.node.id;
    let content = template::render(&compiled.node.data.content, state);

    let mut meta = Map::new();
    meta.insert("nodeId".to_string(), json!(node_id));
    meta.insert("type".to_string(), json!("message"));
    state.record_message(crate::message::Message::ASSISTANT, &content, meta);

    let next = compiled.default_next.clone();
    state.cursor = next.clone();
    state.next = next.clone();

    let mut info = Map::new();
    info.insert("next".to_string(), json!(next));
    state.record_trace(node_id, "message", info);
}

/// `slotfilling`: prompt with quick replies, then pause until the caller
/// supplies a value for the slot.
fn handle_slotfilling(compiled: &CompiledNode, state: &mut RunState) {
    let node_id = &compiled.node.id;
    let data = &compiled.node.data;
    let slot = data.slot.clone().unwrap_or_else(|| "slot".to_string());

    // Seed reply labels into vars so templates can echo the label the
    // user is about to pick ({{Yes}} renders as "Yes").
    for reply in &data.replies {
        if let Some(display) = &reply.display {
            state.vars.insert(display.clone(), json!(display));
        }
    }

    let mut meta = Map::new();
    meta.insert("nodeId".to_string(), json!(node_id));
    meta.insert("type".to_string(), json!("slotfilling"));
    meta.insert("quickReplies".to_string(), json!(&data.replies));
    meta.insert("slot".to_string(), json!(&slot));
    state.record_message(crate::message::Message::ASSISTANT, &data.content, meta);

    let awaiting = Awaiting::Slot {
        node_id: node_id.clone(),
        slot,
        next: compiled.default_next.clone(),
    };
    let mut info = Map::new();
    info.insert("awaiting".to_string(), json!(&awaiting));
    state.record_trace(node_id, "slotfilling", info);

    state.awaiting = Some(awaiting);
    state.cursor = Some(node_id.clone());
    state.next = None;
}

/// `branch`: prompt with the available choices, then pause; each choice
/// routes through the outgoing edge whose `sourceHandle` matches it.
fn handle_branch(compiled: &CompiledNode, state: &mut RunState) {
    let node_id = &compiled.node.id;
    let data = &compiled.node.data;

    let mut routes: FxHashMap<String, String> = FxHashMap::default();
    for edge in &compiled.outgoing {
        if let Some(handle) = &edge.source_handle {
            routes.insert(handle.clone(), edge.target.clone());
        }
    }

    let mut meta = Map::new();
    meta.insert("nodeId".to_string(), json!(node_id));
    meta.insert("type".to_string(), json!("branch"));
    meta.insert("quickReplies".to_string(), json!(&data.replies));
    state.record_message(crate::message::Message::ASSISTANT, &data.content, meta);

    let mut info = Map::new();
    info.insert(
        "awaiting".to_string(),
        json!({"kind": "branch", "routesCount": routes.len()}),
    );
    state.record_trace(node_id, "branch", info);

    state.awaiting = Some(Awaiting::Branch {
        node_id: node_id.clone(),
        routes,
    });
    state.cursor = Some(node_id.clone());
    state.next = None;
}

/// Unrecognized type: record it and dead-end this path.
fn handle_unknown(node_id: &str, tag: &str, state: &mut RunState) {
    tracing::warn!(node_id, node_type = tag, "unrecognized node type; ending turn");
    let mut info = Map::new();
    info.insert("type".to_string(), Value::String(tag.to_string()));
    state.record_trace(node_id, "unknown", info);
    state.cursor = None;
    state.next = None;
}
