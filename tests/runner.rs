//! End-to-end turn scenarios through the run driver.

mod common;
use common::*;

use chatweave::message::Message;
use chatweave::runtimes::{RunRequest, RuntimeConfig, ScenarioRunner};
use chatweave::types::{Action, Awaiting, LAST_BRANCH_VALUE_KEY};
use serde_json::json;

fn request(scenario: &chatweave::graphs::Scenario, text: &str) -> RunRequest {
    RunRequest {
        scenario_id: Some("test".to_string()),
        nodes: scenario.nodes.clone(),
        edges: scenario.edges.clone(),
        text: text.to_string(),
        state: None,
        action: None,
    }
}

#[test]
/// Turn 1 of the greeting scenario: the message chain plays out and the
/// run pauses at the slot prompt. Turn 2 resolves the slot and the run
/// ends with the templated goodbye.
fn test_slot_scenario_two_turns() {
    let scenario = greeting_scenario();
    let runner = ScenarioRunner::new();

    // Turn 1: no action yet.
    let report = runner.run_turn(request(&scenario, "hello"));

    let contents: Vec<&str> = report.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hello", "Hi", "What's your name?"]);
    assert_eq!(report.messages[0].role, Message::USER);
    assert_eq!(report.messages[1].role, Message::ASSISTANT);
    assert!(matches!(
        report.awaiting,
        Some(Awaiting::Slot { ref slot, ref next, .. }) if slot == "name" && next.as_deref() == Some("bye")
    ));
    assert_eq!(report.state.cursor.as_deref(), Some("ask"));
    assert_eq!(report.state.turn, 1);

    // Turn 2: resolve the pause.
    let report = runner.run_turn(RunRequest {
        action: Some(Action::reply("Sam")),
        state: Some(report.state),
        ..request(&scenario, "")
    });

    assert_eq!(report.slots.get("name"), Some(&json!("Sam")));
    assert_eq!(report.messages.last().unwrap().content, "Bye Sam");
    assert!(report.awaiting.is_none());
    assert!(report.state.is_ended());
    assert_eq!(report.state.turn, 2);
}

#[test]
/// Branch routing: a mapped choice lands on the matching edge's target,
/// an unmapped choice ends the run.
fn test_branch_scenario() {
    let scenario = chatweave::graphs::Scenario::new(
        vec![
            branch_node("b", "Continue?", &[("yes", "Yes"), ("no", "No")]),
            message_node("y", "Great!"),
            message_node("n", "Okay, stopping."),
        ],
        vec![handle_edge("b", "y", "yes"), handle_edge("b", "n", "no")],
    );
    let runner = ScenarioRunner::new();

    // Pause at the branch.
    let paused = runner.run_turn(request(&scenario, "hi"));
    assert!(matches!(
        paused.awaiting,
        Some(Awaiting::Branch { ref routes, .. }) if routes.len() == 2
    ));

    // Mapped choice routes to `n`.
    let report = runner.run_turn(RunRequest {
        action: Some(Action::reply("no").with_display("No")),
        state: Some(paused.state.clone()),
        ..request(&scenario, "")
    });
    assert_eq!(report.messages.last().unwrap().content, "Okay, stopping.");
    assert_eq!(report.vars.get(LAST_BRANCH_VALUE_KEY), Some(&json!("no")));
    assert!(report.state.is_ended());

    // Unmapped choice ends the run without further output.
    let before_len = paused.messages.len();
    let report = runner.run_turn(RunRequest {
        action: Some(Action::reply("maybe")),
        state: Some(paused.state),
        ..request(&scenario, "")
    });
    assert_eq!(report.messages.len(), before_len);
    assert!(report.awaiting.is_none());
    assert!(report.state.is_ended());
    let resolved = report
        .trace
        .iter()
        .find(|t| t.node_type == "awaitingResolved")
        .expect("resolution traced");
    assert_eq!(resolved.info.get("value"), Some(&json!("maybe")));
    assert_eq!(resolved.info.get("next"), Some(&json!(null)));
}

#[test]
/// Re-polling a paused run without an action leaves the pause — and the
/// chat history — untouched.
fn test_repoll_while_paused_is_noop() {
    let scenario = greeting_scenario();
    let runner = ScenarioRunner::new();

    let paused = runner.run_turn(request(&scenario, "hello"));
    let messages_before = paused.messages.len();
    let trace_before = paused.trace.len();
    let awaiting_before = paused.awaiting.clone();

    let repolled = runner.run_turn(RunRequest {
        state: Some(paused.state),
        ..request(&scenario, "")
    });

    assert_eq!(repolled.messages.len(), messages_before);
    assert_eq!(repolled.trace.len(), trace_before);
    assert_eq!(repolled.awaiting, awaiting_before);
    assert_eq!(repolled.state.cursor.as_deref(), Some("ask"));
    assert_eq!(repolled.state.turn, 2);
}

#[test]
/// An unknown node type is recorded in the trace and dead-ends the run
/// without erroring.
fn test_unknown_node_type_dead_ends() {
    let scenario = chatweave::graphs::Scenario::new(
        vec![message_node("hi", "Hi"), unknown_node("mystery", "carousel")],
        vec![edge("hi", "mystery")],
    );
    let runner = ScenarioRunner::new();

    let report = runner.run_turn(request(&scenario, ""));
    assert_eq!(report.messages.len(), 1); // only "Hi"
    assert!(report.awaiting.is_none());
    assert!(report.state.is_ended());

    let unknown = report
        .trace
        .iter()
        .find(|t| t.node_type == "unknown")
        .expect("unknown node traced");
    assert_eq!(unknown.node_id, "mystery");
    assert_eq!(unknown.info.get("type"), Some(&json!("carousel")));
}

#[test]
/// A cyclic message graph is cut off at the per-turn step limit and
/// remains resumable.
fn test_cyclic_graph_step_limit() {
    let scenario = chatweave::graphs::Scenario::new(
        vec![message_node("a", "ping"), message_node("b", "pong")],
        vec![edge("a", "b"), edge("b", "a")],
    );
    let runner =
        ScenarioRunner::with_config(RuntimeConfig::default().with_max_steps_per_turn(4));

    let report = runner.run_turn(request(&scenario, ""));
    assert_eq!(report.messages.len(), 4);
    let limited = report
        .trace
        .iter()
        .find(|t| t.node_type == "stepLimit")
        .expect("cutoff traced");
    assert_eq!(limited.info.get("steps"), Some(&json!(4)));

    // Cursor parked on the next unexecuted node; the chain continues.
    assert!(report.state.cursor.is_some());
    assert!(!report.state.is_ended());

    let resumed = runner.run_turn(RunRequest {
        state: Some(report.state),
        ..request(&scenario, "")
    });
    assert_eq!(resumed.messages.len(), 8);
}

#[test]
/// Run identity is assigned on the first turn and preserved when the
/// state is replayed; the turn counter increments monotonically.
fn test_run_identity_and_turns() {
    let scenario = greeting_scenario();
    let runner = ScenarioRunner::new();

    let first = runner.run_turn(request(&scenario, "hello"));
    assert!(!first.run_id.is_empty());
    assert_eq!(first.state.turn, 1);

    let second = runner.run_turn(RunRequest {
        state: Some(first.state),
        action: Some(Action::reply("Sam")),
        ..request(&scenario, "")
    });
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.state.turn, 2);

    // A fresh request starts a new run.
    let fresh = runner.run_turn(request(&scenario, "hello"));
    assert_ne!(fresh.run_id, first.run_id);
}

#[test]
/// Non-empty input is recorded as a user message with its source meta;
/// empty input records nothing.
fn test_user_message_recording() {
    let scenario = greeting_scenario();
    let runner = ScenarioRunner::new();

    let report = runner.run_turn(request(&scenario, "hello there"));
    let user = &report.messages[0];
    assert_eq!(user.role, Message::USER);
    assert_eq!(user.content, "hello there");
    assert_eq!(user.meta.get("source"), Some(&json!("input")));

    let silent = runner.run_turn(request(&scenario, ""));
    assert!(silent.messages.iter().all(|m| m.role != Message::USER));
}

#[test]
/// Slot-filling seeds its reply labels into vars so templates can echo
/// them, and the prompt message carries the quick replies.
fn test_slotfilling_seeds_reply_vars() {
    let scenario = chatweave::graphs::Scenario::new(
        vec![
            slot_node("ask", "Pick one", "choice", &[("1", "A"), ("2", "B")]),
            message_node("echo", "You saw {{A}} and {{B}}"),
        ],
        vec![edge("ask", "echo")],
    );
    let runner = ScenarioRunner::new();

    let paused = runner.run_turn(request(&scenario, ""));
    assert_eq!(paused.vars.get("A"), Some(&json!("A")));
    assert_eq!(paused.vars.get("B"), Some(&json!("B")));

    let prompt = paused.messages.last().unwrap();
    assert_eq!(prompt.meta.get("slot"), Some(&json!("choice")));
    assert_eq!(
        prompt.meta.get("quickReplies").and_then(|v| v.as_array()).map(Vec::len),
        Some(2)
    );

    let report = runner.run_turn(RunRequest {
        state: Some(paused.state),
        action: Some(Action::reply("1")),
        ..request(&scenario, "")
    });
    assert_eq!(
        report.messages.last().unwrap().content,
        "You saw A and B"
    );
}

#[test]
/// An empty graph still produces a well-formed, ended report.
fn test_empty_graph_is_recovered() {
    let runner = ScenarioRunner::new();
    let report = runner.run_turn(RunRequest {
        text: "anyone home?".to_string(),
        ..Default::default()
    });
    assert_eq!(report.messages.len(), 1); // just the user echo
    assert!(report.awaiting.is_none());
    assert!(report.state.is_ended());
}

#[test]
/// An action supplied while nothing is awaited is ignored and the run
/// starts normally.
fn test_action_without_pause_is_ignored() {
    let scenario = greeting_scenario();
    let runner = ScenarioRunner::new();

    let report = runner.run_turn(RunRequest {
        action: Some(Action::reply("stray")),
        ..request(&scenario, "hello")
    });
    assert!(report.slots.is_empty());
    assert!(matches!(report.awaiting, Some(Awaiting::Slot { .. })));
}

#[test]
/// The report's convenience views mirror the embedded state, and the
/// state survives a serde round-trip mid-run.
fn test_report_views_and_state_round_trip() {
    let scenario = greeting_scenario();
    let runner = ScenarioRunner::new();

    let report = runner.run_turn(request(&scenario, "hello"));
    assert_eq!(report.messages, report.state.messages);
    assert_eq!(report.trace, report.state.trace);
    assert_eq!(report.awaiting, report.state.awaiting);

    let json = serde_json::to_string(&report.state).unwrap();
    let replayed: chatweave::state::RunState = serde_json::from_str(&json).unwrap();

    let resumed = runner.run_turn(RunRequest {
        state: Some(replayed),
        action: Some(Action::reply("Sam")),
        ..request(&scenario, "")
    });
    assert_eq!(resumed.messages.last().unwrap().content, "Bye Sam");
}
