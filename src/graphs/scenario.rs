//! Builder-graph types and topology helpers.
//!
//! A [`Scenario`] is the node/edge description authored in a visual
//! builder, supplied fresh on every call and never mutated by the engine.
//! This module owns the graph's shape: per-node outgoing edges, incoming
//! counts, start-node selection, structural validation, and the content
//! fingerprint used as the compile-cache key.

use miette::Diagnostic;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::hash::Hasher;
use thiserror::Error;

use crate::types::NodeType;

/// One selectable quick reply offered by a slot-filling or branch node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuickReply {
    /// The value submitted when the reply is chosen (branch condition id
    /// or slot value).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// The label shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Type-specific payload of a builder node.
///
/// Only the fields the engine reads are modeled; anything else the
/// builder attaches is preserved in `extra` so a round-tripped scenario
/// loses nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeData {
    /// Message or prompt text; may contain `{{name}}` placeholders.
    pub content: String,
    /// Slot name a slot-filling node stores its answer under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    /// Quick replies offered to the user.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<QuickReply>,
    /// Unrecognized builder fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node of the builder graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioNode {
    /// Unique node id within the scenario.
    pub id: String,
    /// Node type tag; unrecognized tags become [`NodeType::Unknown`].
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Type-specific payload.
    #[serde(default)]
    pub data: NodeData,
}

/// A directed edge of the builder graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Discriminator used by branch nodes to map a discrete choice to
    /// this edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
}

/// Structural problems a scenario can have.
///
/// The engine itself never hard-fails on graph shape (it degrades per the
/// trace log instead); these errors exist so upstream callers can reject
/// malformed graphs before running them.
#[derive(Debug, Error, Diagnostic)]
pub enum ScenarioError {
    /// The scenario has no nodes at all.
    #[error("scenario has no nodes")]
    #[diagnostic(
        code(chatweave::graphs::empty_scenario),
        help("A runnable scenario needs at least one node.")
    )]
    EmptyScenario,

    /// Two nodes share an id.
    #[error("duplicate node id: {id}")]
    #[diagnostic(code(chatweave::graphs::duplicate_node_id))]
    DuplicateNodeId { id: String },

    /// No node has zero incoming edges, so no start node exists.
    #[error("no start candidate: every node has an incoming edge")]
    #[diagnostic(
        code(chatweave::graphs::no_start_candidate),
        help("Exactly one node must have no incoming edges; check for cycles reaching every node.")
    )]
    NoStartCandidate,

    /// More than one node has zero incoming edges.
    #[error("multiple start candidates: {}", candidates.join(", "))]
    #[diagnostic(
        code(chatweave::graphs::multiple_start_candidates),
        help("Exactly one node must have no incoming edges; connect or remove the extras.")
    )]
    MultipleStartCandidates { candidates: Vec<String> },

    /// An edge references a node id that does not exist.
    #[error("edge {source_id} -> {target} references a missing node")]
    #[diagnostic(code(chatweave::graphs::dangling_edge))]
    DanglingEdge { source_id: String, target: String },
}

/// The immutable builder graph for one run.
///
/// # Examples
///
/// ```
/// use chatweave::graphs::{Scenario, ScenarioEdge, ScenarioNode};
///
/// let scenario = Scenario::new(
///     vec![
///         ScenarioNode { id: "a".into(), ..Default::default() },
///         ScenarioNode { id: "b".into(), ..Default::default() },
///     ],
///     vec![ScenarioEdge { source: "a".into(), target: "b".into(), source_handle: None }],
/// );
///
/// assert_eq!(scenario.start_node(), Some("a"));
/// assert_eq!(scenario.incoming_count("b"), 1);
/// assert!(scenario.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// All builder nodes, in the order the builder listed them.
    pub nodes: Vec<ScenarioNode>,
    /// All builder edges.
    pub edges: Vec<ScenarioEdge>,
}

impl Scenario {
    /// Creates a scenario from builder nodes and edges.
    #[must_use]
    pub fn new(nodes: Vec<ScenarioNode>, edges: Vec<ScenarioEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ScenarioNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All edges leaving `source`, in declaration order.
    pub fn outgoing<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a ScenarioEdge> {
        self.edges.iter().filter(move |e| e.source == source)
    }

    /// Number of edges entering `node_id`.
    #[must_use]
    pub fn incoming_count(&self, node_id: &str) -> usize {
        self.edges.iter().filter(|e| e.target == node_id).count()
    }

    /// Node ids with zero incoming edges, in declaration order.
    #[must_use]
    pub fn start_candidates(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| self.incoming_count(&n.id) == 0)
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Picks the start node: the unique node with no incoming edge.
    ///
    /// When zero or several candidates exist the first listed node is
    /// used instead and a warning is logged — the degraded behavior
    /// callers get when they skip [`validate`](Self::validate). Returns
    /// `None` only for an empty scenario.
    #[must_use]
    pub fn start_node(&self) -> Option<&str> {
        let candidates = self.start_candidates();
        match candidates.as_slice() {
            [single] => Some(*single),
            _ => {
                let fallback = self.nodes.first().map(|n| n.id.as_str());
                if let Some(id) = fallback {
                    tracing::warn!(
                        candidates = candidates.len(),
                        fallback = id,
                        "ambiguous start node; falling back to first listed node"
                    );
                }
                fallback
            }
        }
    }

    /// Validates the scenario's structure, turning the degradations
    /// [`start_node`](Self::start_node) papers over into hard errors.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.nodes.is_empty() {
            return Err(ScenarioError::EmptyScenario);
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(ScenarioError::DuplicateNodeId {
                    id: node.id.clone(),
                });
            }
        }
        for edge in &self.edges {
            if !seen.contains(edge.source.as_str()) || !seen.contains(edge.target.as_str()) {
                return Err(ScenarioError::DanglingEdge {
                    source_id: edge.source.clone(),
                    target: edge.target.clone(),
                });
            }
        }
        match self.start_candidates().as_slice() {
            [] => Err(ScenarioError::NoStartCandidate),
            [_] => Ok(()),
            many => Err(ScenarioError::MultipleStartCandidates {
                candidates: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    /// Content hash over the normalized node and edge sets.
    ///
    /// Nodes are hashed sorted by id and edges sorted by
    /// (source, handle, target), so structurally identical scenarios
    /// fingerprint identically regardless of input ordering. Used as the
    /// compile-cache key.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();

        let mut nodes: Vec<&ScenarioNode> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        for node in nodes {
            hasher.write(node.id.as_bytes());
            hasher.write_u8(0);
            hasher.write(node.node_type.as_str().as_bytes());
            hasher.write_u8(0);
            // serde_json maps are sorted by key, so this form is canonical.
            let data = serde_json::to_string(&node.data).unwrap_or_default();
            hasher.write(data.as_bytes());
            hasher.write_u8(0xff);
        }

        let mut edges: Vec<&ScenarioEdge> = self.edges.iter().collect();
        edges.sort_by(|a, b| {
            (&a.source, &a.source_handle, &a.target).cmp(&(&b.source, &b.source_handle, &b.target))
        });
        for edge in edges {
            hasher.write(edge.source.as_bytes());
            hasher.write_u8(0);
            if let Some(handle) = &edge.source_handle {
                hasher.write(handle.as_bytes());
            }
            hasher.write_u8(0);
            hasher.write(edge.target.as_bytes());
            hasher.write_u8(0xff);
        }

        hasher.finish()
    }
}
