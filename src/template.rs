//! `{{name}}` placeholder rendering for node message content.
//!
//! Templates are resolved against the run state: a placeholder takes the
//! slot of the same name if one exists, else the variable, else renders
//! as the empty string. There is no escaping and no recursive expansion,
//! and unknown identifiers never error — the engine must always produce
//! a well-formed message.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::state::RunState;

/// Placeholder token: `{{identifier}}` with optional inner whitespace.
/// Identifiers are alphanumerics, underscores, and hyphens.
static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+)\s*\}\}").expect("valid pattern"));

/// Renders a text template against the current slot/variable bindings.
///
/// Lookup order per placeholder: `slots`, then `vars`, then the empty
/// string. JSON strings render without quotes; `null` renders empty;
/// any other JSON value renders in its compact JSON form. Literal text
/// outside placeholders passes through untouched.
///
/// # Examples
///
/// ```
/// use chatweave::state::RunState;
/// use chatweave::template::render;
/// use serde_json::json;
///
/// let state = RunState::builder()
///     .with_slot("a", json!("1"))
///     .with_var("b", json!("2"))
///     .build();
///
/// assert_eq!(render("{{a}}-{{b}}", &state), "1-2");
/// assert_eq!(render("{{missing}}!", &state), "!");
/// assert_eq!(render("plain text", &state), "plain text");
/// ```
#[must_use]
pub fn render(text: &str, state: &RunState) -> String {
    TEMPLATE_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            state
                .slots
                .get(key)
                .or_else(|| state.vars.get(key))
                .map(display_value)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Stringifies a bound value for interpolation.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
