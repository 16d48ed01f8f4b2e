use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single chat entry in a scenario run, with a role, text content, and
/// free-form metadata.
///
/// Messages are what the engine hands back to the caller for rendering:
/// user input echoes and assistant output produced by scenario nodes. Each
/// message carries the timestamp it was recorded at and a `meta` object
/// whose shape depends on the producing node (e.g. quick replies for a
/// slot-filling prompt).
///
/// # Examples
///
/// ```
/// use chatweave::message::Message;
///
/// let user_msg = Message::user("What's my balance?");
/// let assistant_msg = Message::assistant("Your balance is 42.");
///
/// assert!(user_msg.has_role(Message::USER));
/// assert!(assistant_msg.has_role(Message::ASSISTANT));
/// ```
///
/// # Serialization
///
/// Messages serialize to the wire shape consumed by scenario frontends:
/// `{ts, role, content, meta}`. Deserialization tolerates a missing
/// `meta` (defaults to an empty object).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Timestamp the message was appended to the run state.
    #[serde(default = "Utc::now")]
    pub ts: DateTime<Utc>,
    /// The role of the message sender (`"user"` or `"assistant"`).
    pub role: String,
    /// The text content of the message.
    pub content: String,
    /// Node-specific metadata (producing node id, quick replies, ...).
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// Assistant (scenario output) message role.
    pub const ASSISTANT: &'static str = "assistant";

    /// Creates a new message with the specified role and content.
    ///
    /// # Examples
    /// ```
    /// use chatweave::message::Message;
    ///
    /// let msg = Message::new(Message::USER, "Hello!");
    /// assert_eq!(msg.role, "user");
    /// assert!(msg.meta.is_empty());
    /// ```
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            ts: Utc::now(),
            role: role.to_string(),
            content: content.to_string(),
            meta: Map::new(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Attaches metadata, replacing any existing meta object.
    ///
    /// # Examples
    /// ```
    /// use chatweave::message::Message;
    /// use serde_json::{json, Map};
    ///
    /// let mut meta = Map::new();
    /// meta.insert("nodeId".into(), json!("n1"));
    /// let msg = Message::assistant("Hi").with_meta(meta);
    /// assert_eq!(msg.meta.get("nodeId"), Some(&json!("n1")));
    /// ```
    #[must_use]
    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
