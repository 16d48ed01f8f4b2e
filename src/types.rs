//! Core types for the chatweave scenario engine.
//!
//! This module defines the closed set of node types the engine executes,
//! the pause descriptor that suspends a run between turns, and the action
//! shape callers use to resolve a pause.
//!
//! # Key Types
//!
//! - [`NodeType`]: Closed enum over the builder node types
//! - [`Awaiting`]: Pause descriptor stored in the run state
//! - [`Action`]: Caller-supplied resolution for a pending pause

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Variable key holding the most recent `action.display` value, kept for
/// UI convenience so templates can echo what the user tapped.
pub const LAST_DISPLAY_KEY: &str = "__last_display__";

/// Variable key holding the most recent branch choice value.
pub const LAST_BRANCH_VALUE_KEY: &str = "__last_branch_value__";

/// Identifies the type of a builder node.
///
/// The engine recognizes three executable node types; anything else is
/// carried as [`Unknown`](Self::Unknown) with its original tag preserved
/// so the trace can report what was skipped. Matching on `NodeType` is
/// exhaustive, so adding a variant forces every handler site to be
/// revisited.
///
/// # Wire format
///
/// Node types serialize as their plain builder tag (`"message"`,
/// `"slotfilling"`, `"branch"`); unrecognized tags round-trip unchanged.
///
/// # Examples
///
/// ```
/// use chatweave::types::NodeType;
///
/// assert_eq!(NodeType::from("message"), NodeType::Message);
/// assert_eq!(NodeType::from("weather"), NodeType::Unknown("weather".into()));
/// assert_eq!(NodeType::Branch.as_str(), "branch");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Render a text template and advance to the next node.
    Message,
    /// Prompt for a slot value and pause until the caller supplies one.
    Slotfilling,
    /// Offer discrete choices and pause; each choice routes to an edge.
    Branch,
    /// Unrecognized builder type; treated as a dead end.
    Unknown(String),
}

impl NodeType {
    /// The builder tag for this node type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Message => "message",
            NodeType::Slotfilling => "slotfilling",
            NodeType::Branch => "branch",
            NodeType::Unknown(tag) => tag,
        }
    }
}

impl Default for NodeType {
    fn default() -> Self {
        NodeType::Unknown(String::new())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        match s {
            "message" => NodeType::Message,
            "slotfilling" => NodeType::Slotfilling,
            "branch" => NodeType::Branch,
            other => NodeType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        NodeType::from(s.as_str())
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

/// Pause descriptor: why a run is suspended and how it resumes.
///
/// Presence of an `Awaiting` value in the run state means the run has
/// emitted output and is waiting for a caller-supplied [`Action`] before
/// any further node executes. There are two pause kinds:
///
/// - **slot**: a slot-filling node asked a question; the action's value
///   is stored under `slot` and execution resumes at `next`.
/// - **branch**: a branch node offered choices; the action's value is
///   looked up in `routes` to find the resume node.
///
/// # Wire format
///
/// Internally tagged on `kind`:
///
/// ```json
/// {"kind": "slot", "nodeId": "ask", "slot": "name", "next": "bye"}
/// {"kind": "branch", "nodeId": "b", "routes": {"yes": "y", "no": "n"}}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Awaiting {
    /// Waiting for a slot value.
    Slot {
        /// The slot-filling node that initiated the pause.
        #[serde(rename = "nodeId")]
        node_id: String,
        /// Name of the slot the incoming value is stored under.
        slot: String,
        /// Node to resume at once the slot is filled; `None` ends the run.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// Waiting for a discrete choice.
    Branch {
        /// The branch node that initiated the pause.
        #[serde(rename = "nodeId")]
        node_id: String,
        /// Choice value → resume node id.
        routes: FxHashMap<String, String>,
    },
}

impl Awaiting {
    /// The pause kind tag (`"slot"` or `"branch"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Awaiting::Slot { .. } => "slot",
            Awaiting::Branch { .. } => "branch",
        }
    }

    /// Id of the node that initiated the pause.
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            Awaiting::Slot { node_id, .. } | Awaiting::Branch { node_id, .. } => node_id,
        }
    }
}

/// Caller-supplied resolution for a pending pause.
///
/// `value` is authoritative: it is what gets stored in a slot or matched
/// against branch routes. `display` is cosmetic only (the label the user
/// saw) and is remembered under [`LAST_DISPLAY_KEY`] for UI convenience.
///
/// # Examples
///
/// ```
/// use chatweave::types::Action;
///
/// let action = Action::reply("cond_yes").with_display("Yes please");
/// assert_eq!(action.kind, Action::REPLY);
/// assert_eq!(action.value, "cond_yes");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action discriminator; currently always [`Action::REPLY`].
    #[serde(rename = "type", default = "default_action_kind")]
    pub kind: String,
    /// The authoritative value to store or route on.
    pub value: String,
    /// Optional display label, cosmetic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

fn default_action_kind() -> String {
    Action::REPLY.to_string()
}

impl Action {
    /// The reply action discriminator.
    pub const REPLY: &'static str = "reply";

    /// Creates a reply action with the given value.
    #[must_use]
    pub fn reply(value: &str) -> Self {
        Self {
            kind: Self::REPLY.to_string(),
            value: value.to_string(),
            display: None,
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_display(mut self, display: &str) -> Self {
        self.display = Some(display.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Tests the string round-trip for every node type, including
    /// preservation of unrecognized tags.
    fn test_node_type_round_trip() {
        for tag in ["message", "slotfilling", "branch", "carousel"] {
            let t = NodeType::from(tag);
            assert_eq!(t.as_str(), tag);
            assert_eq!(String::from(t.clone()), tag);
        }
        assert_eq!(
            NodeType::from("carousel"),
            NodeType::Unknown("carousel".to_string())
        );
    }

    #[test]
    /// Tests that node types serialize as their bare builder tag.
    fn test_node_type_serde() {
        let json = serde_json::to_string(&NodeType::Slotfilling).unwrap();
        assert_eq!(json, "\"slotfilling\"");
        let parsed: NodeType = serde_json::from_str("\"branch\"").unwrap();
        assert_eq!(parsed, NodeType::Branch);
    }

    #[test]
    /// Tests the internally tagged wire shape of pause descriptors.
    fn test_awaiting_serde() {
        let slot = Awaiting::Slot {
            node_id: "ask".to_string(),
            slot: "name".to_string(),
            next: Some("bye".to_string()),
        };
        let v = serde_json::to_value(&slot).unwrap();
        assert_eq!(v["kind"], "slot");
        assert_eq!(v["nodeId"], "ask");
        assert_eq!(v["next"], "bye");

        let parsed: Awaiting = serde_json::from_value(v).unwrap();
        assert_eq!(parsed, slot);
        assert_eq!(parsed.kind(), "slot");
        assert_eq!(parsed.node_id(), "ask");
    }

    #[test]
    /// Tests that the action discriminator defaults to "reply" on the wire.
    fn test_action_default_kind() {
        let action: Action = serde_json::from_str(r#"{"value":"x"}"#).unwrap();
        assert_eq!(action.kind, Action::REPLY);
        assert_eq!(action.value, "x");
        assert_eq!(action.display, None);
    }
}
