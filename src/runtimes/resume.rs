//! Resolution of a pending pause by a caller-supplied action.
//!
//! This runs once, synchronously, before the compiled flow executes for
//! the turn, and is the sole mechanism for leaving a paused state.

use serde_json::{Map, json};

use crate::state::RunState;
use crate::types::{Action, Awaiting, LAST_BRANCH_VALUE_KEY, LAST_DISPLAY_KEY};

/// Outcome of attempting to resolve a pause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The state was not paused; the router decides where to enter.
    NotPaused,
    /// The state is paused and no action arrived; the pause persists
    /// unchanged and the graph must not run this turn.
    StillPaused,
    /// The pause was consumed; execution resumes at `next` (`None`
    /// means the run ended with this resolution).
    Resumed { next: Option<String> },
}

/// Applies `action` to a paused state.
///
/// - **slot pause**: stores the action value under the awaited slot,
///   remembers the display label under [`LAST_DISPLAY_KEY`], and resumes
///   at the pause's recorded next node.
/// - **branch pause**: looks the value up in the routes; an unmapped
///   value ends the run rather than erring ("the user picked something
///   unroutable"). The choice is remembered under
///   [`LAST_BRANCH_VALUE_KEY`].
///
/// Either way the pause is cleared, the cursor follows the resolution,
/// and an `awaitingResolved` trace entry records what happened.
pub fn apply_action(state: &mut RunState, action: Option<&Action>) -> Resolution {
    let Some(awaiting) = state.awaiting.clone() else {
        return Resolution::NotPaused;
    };
    let Some(action) = action else {
        tracing::debug!(kind = awaiting.kind(), "paused with no action; pause persists");
        return Resolution::StillPaused;
    };

    match awaiting {
        Awaiting::Slot {
            node_id,
            slot,
            next,
        } => {
            state
                .slots
                .insert(slot.clone(), json!(action.value.clone()));
            if let Some(display) = &action.display {
                state.vars.insert(LAST_DISPLAY_KEY.to_string(), json!(display));
            }
            state.cursor = next.clone();
            state.next = next.clone();
            state.awaiting = None;

            let mut info = Map::new();
            info.insert("kind".to_string(), json!("slot"));
            info.insert("slot".to_string(), json!(&slot));
            info.insert("value".to_string(), json!(&action.value));
            info.insert("next".to_string(), json!(&next));
            state.record_trace(&node_id, "awaitingResolved", info);

            Resolution::Resumed { next }
        }
        Awaiting::Branch { node_id, routes } => {
            let picked = routes.get(&action.value).cloned();
            if picked.is_none() {
                tracing::debug!(value = %action.value, "no route for branch choice; ending run");
            }
            state
                .vars
                .insert(LAST_BRANCH_VALUE_KEY.to_string(), json!(action.value));
            if let Some(display) = &action.display {
                state.vars.insert(LAST_DISPLAY_KEY.to_string(), json!(display));
            }
            state.cursor = picked.clone();
            state.next = picked.clone();
            state.awaiting = None;

            let mut info = Map::new();
            info.insert("kind".to_string(), json!("branch"));
            info.insert("value".to_string(), json!(&action.value));
            info.insert("next".to_string(), json!(&picked));
            state.record_trace(&node_id, "awaitingResolved", info);

            Resolution::Resumed { next: picked }
        }
    }
}
