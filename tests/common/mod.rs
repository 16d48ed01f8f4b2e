//! Shared helpers for integration tests: compact scenario construction.

#![allow(dead_code)]

use chatweave::graphs::{NodeData, QuickReply, Scenario, ScenarioEdge, ScenarioNode};
use chatweave::types::NodeType;

/// A `message` node rendering `content`.
pub fn message_node(id: &str, content: &str) -> ScenarioNode {
    ScenarioNode {
        id: id.to_string(),
        node_type: NodeType::Message,
        data: NodeData {
            content: content.to_string(),
            ..Default::default()
        },
    }
}

/// A `slotfilling` node prompting `content` and storing into `slot`.
pub fn slot_node(id: &str, content: &str, slot: &str, replies: &[(&str, &str)]) -> ScenarioNode {
    ScenarioNode {
        id: id.to_string(),
        node_type: NodeType::Slotfilling,
        data: NodeData {
            content: content.to_string(),
            slot: Some(slot.to_string()),
            replies: quick_replies(replies),
            ..Default::default()
        },
    }
}

/// A `branch` node offering `replies` as choices.
pub fn branch_node(id: &str, content: &str, replies: &[(&str, &str)]) -> ScenarioNode {
    ScenarioNode {
        id: id.to_string(),
        node_type: NodeType::Branch,
        data: NodeData {
            content: content.to_string(),
            replies: quick_replies(replies),
            ..Default::default()
        },
    }
}

/// A node with an unrecognized builder type.
pub fn unknown_node(id: &str, tag: &str) -> ScenarioNode {
    ScenarioNode {
        id: id.to_string(),
        node_type: NodeType::Unknown(tag.to_string()),
        ..Default::default()
    }
}

/// A plain edge.
pub fn edge(source: &str, target: &str) -> ScenarioEdge {
    ScenarioEdge {
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
    }
}

/// An edge with a branch discriminator handle.
pub fn handle_edge(source: &str, target: &str, handle: &str) -> ScenarioEdge {
    ScenarioEdge {
        source: source.to_string(),
        target: target.to_string(),
        source_handle: Some(handle.to_string()),
    }
}

/// `(value, display)` pairs into quick replies.
pub fn quick_replies(pairs: &[(&str, &str)]) -> Vec<QuickReply> {
    pairs
        .iter()
        .map(|(value, display)| QuickReply {
            value: Some(value.to_string()),
            display: Some(display.to_string()),
        })
        .collect()
}

/// The three-node greeting scenario used across tests:
/// `hi --(message)--> ask --(slotfilling name)--> bye --(message)`.
pub fn greeting_scenario() -> Scenario {
    Scenario::new(
        vec![
            message_node("hi", "Hi"),
            slot_node("ask", "What's your name?", "name", &[("sam", "Sam")]),
            message_node("bye", "Bye {{name}}"),
        ],
        vec![edge("hi", "ask"), edge("ask", "bye")],
    )
}
