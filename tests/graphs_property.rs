//! Property tests for template rendering and scenario topology.

use proptest::prelude::*;

use chatweave::graphs::{Scenario, ScenarioEdge, ScenarioNode};
use chatweave::state::RunState;
use chatweave::template::render;
use chatweave::types::NodeType;
use serde_json::json;

/// Valid placeholder identifiers.
fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_\\-]{1,12}").unwrap()
}

/// Text with no placeholder syntax in it.
fn plain_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 .,!?']{0,40}").unwrap()
}

fn node(id: &str) -> ScenarioNode {
    ScenarioNode {
        id: id.to_string(),
        node_type: NodeType::Message,
        ..Default::default()
    }
}

fn edge(source: &str, target: &str) -> ScenarioEdge {
    ScenarioEdge {
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
    }
}

proptest! {
    #[test]
    /// Text without placeholder syntax renders unchanged.
    fn prop_plain_text_is_identity(text in plain_text_strategy()) {
        let state = RunState::default();
        prop_assert_eq!(render(&text, &state), text);
    }

    #[test]
    /// A bound placeholder always renders its slot value; an unbound one
    /// always renders empty. Rendering never panics.
    fn prop_placeholder_substitution(
        key in identifier_strategy(),
        value in plain_text_strategy(),
    ) {
        prop_assume!(key != "__unbound__");
        let state = RunState::builder().with_slot(&key, json!(value)).build();
        let rendered = render(&format!("<{{{{{key}}}}}>"), &state);
        prop_assert_eq!(rendered, format!("<{value}>"));

        let empty = render("{{__unbound__}}", &state);
        prop_assert_eq!(empty, "");
    }

    #[test]
    /// In a linear chain the unique zero-indegree node is always picked
    /// as the start, regardless of node listing order.
    fn prop_linear_chain_start(mut ids in prop::collection::vec("[a-z]{1,8}", 2..8)) {
        ids.sort();
        ids.dedup();
        prop_assume!(ids.len() >= 2);

        let edges: Vec<ScenarioEdge> = ids
            .windows(2)
            .map(|pair| edge(&pair[0], &pair[1]))
            .collect();

        let mut nodes: Vec<ScenarioNode> = ids.iter().map(|id| node(id)).collect();
        nodes.reverse(); // listing order must not matter
        let scenario = Scenario::new(nodes, edges);

        prop_assert_eq!(scenario.start_node(), Some(ids[0].as_str()));
        prop_assert!(scenario.validate().is_ok());
    }

    #[test]
    /// The fingerprint is invariant under any rotation of the node and
    /// edge listings.
    fn prop_fingerprint_order_invariant(
        rotate_nodes in 0usize..8,
        rotate_edges in 0usize..8,
    ) {
        let ids = ["a", "b", "c", "d", "e"];
        let nodes: Vec<ScenarioNode> = ids.iter().map(|id| node(id)).collect();
        let edges: Vec<ScenarioEdge> = ids
            .windows(2)
            .map(|pair| edge(pair[0], pair[1]))
            .collect();
        let scenario = Scenario::new(nodes.clone(), edges.clone());

        let mut rotated_nodes = nodes;
        rotated_nodes.rotate_left(rotate_nodes % ids.len());
        let mut rotated_edges = edges;
        rotated_edges.rotate_left(rotate_edges % (ids.len() - 1));
        let rotated = Scenario::new(rotated_nodes, rotated_edges);

        prop_assert_eq!(scenario.fingerprint(), rotated.fingerprint());
    }
}
