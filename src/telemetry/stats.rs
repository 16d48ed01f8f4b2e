//! Aggregation of turn events into a per-scenario summary.
//!
//! This is the read side of the telemetry log: fold a sequence of
//! [`TurnEvent`]s (typically read back from a JSONL file) into run-level
//! statistics — how many runs completed, where the rest dropped off,
//! which slot values and branch choices occurred, and when completions
//! happened by day and by hour.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TurnEvent;

/// Selection and shaping parameters for a summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsQuery {
    /// Scenario whose events are aggregated.
    pub scenario_id: String,
    /// Inclusive lower timestamp bound.
    pub from_ts: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub to_ts: Option<DateTime<Utc>>,
    /// Day the hourly buckets cover; defaults to today (UTC).
    pub day: Option<NaiveDate>,
    /// Slot whose value distribution is reported.
    pub slot: String,
}

impl StatsQuery {
    /// Default slot for the value distribution.
    pub const DEFAULT_SLOT: &'static str = "data";

    /// Creates a query for one scenario with default shaping.
    #[must_use]
    pub fn new(scenario_id: &str) -> Self {
        Self {
            scenario_id: scenario_id.to_string(),
            from_ts: None,
            to_ts: None,
            day: None,
            slot: Self::DEFAULT_SLOT.to_string(),
        }
    }

    /// Restricts aggregation to events at or after `from_ts`.
    #[must_use]
    pub fn with_from_ts(mut self, from_ts: DateTime<Utc>) -> Self {
        self.from_ts = Some(from_ts);
        self
    }

    /// Restricts aggregation to events at or before `to_ts`.
    #[must_use]
    pub fn with_to_ts(mut self, to_ts: DateTime<Utc>) -> Self {
        self.to_ts = Some(to_ts);
        self
    }

    /// Selects the day the hourly buckets cover.
    #[must_use]
    pub fn with_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    /// Selects the slot whose value distribution is reported.
    #[must_use]
    pub fn with_slot(mut self, slot: &str) -> Self {
        self.slot = slot.to_string();
        self
    }
}

/// Runs that stalled at a pause, by pause kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropoff {
    pub slot: usize,
    pub branch: usize,
}

/// Completed-run count for one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub runs: usize,
}

/// Completed-run count for one hour of the target day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u32,
    pub runs: usize,
}

/// Aggregated statistics for one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub scenario_id: String,
    /// Distinct run ids seen.
    pub total_runs: usize,
    /// Runs whose final event had no pending pause.
    pub completed_runs: usize,
    /// Stalled runs by the kind of pause they stalled at.
    pub dropoff: Dropoff,
    /// Distribution of the queried slot's final values.
    pub slot_dist: FxHashMap<String, usize>,
    /// Distribution of branch choice values across runs.
    pub branch_dist: FxHashMap<String, usize>,
    /// Mean final turn count per run.
    pub avg_turns: f64,
    /// Mean total step count per run.
    pub avg_steps: f64,
    /// Completed runs per day, sorted by day.
    pub by_day: Vec<DayCount>,
    /// Completed runs per hour of `target_day` (24 buckets).
    pub by_hour: Vec<HourCount>,
    /// Day the hourly buckets cover.
    pub target_day: NaiveDate,
}

/// Final observed state of one run while folding events.
#[derive(Debug)]
struct RunAgg {
    last_ts: DateTime<Utc>,
    last_turn: u64,
    total_steps: usize,
    last_awaiting_kind: Option<String>,
    slot_value: Option<String>,
    branch_picked: FxHashMap<String, String>,
}

/// Folds `events` into a per-scenario summary.
///
/// Events outside the query's scenario or timestamp bounds are ignored.
/// Within a run, the latest event by timestamp determines the run's
/// final state (completion, pause kind, slot value); steps accumulate
/// across turns and branch choices accumulate across events.
///
/// # Examples
///
/// ```
/// use chatweave::telemetry::stats::{StatsQuery, summarize};
///
/// let summary = summarize(&[], &StatsQuery::new("faq"));
/// assert_eq!(summary.total_runs, 0);
/// assert_eq!(summary.by_hour.len(), 24);
/// ```
#[must_use]
pub fn summarize(events: &[TurnEvent], query: &StatsQuery) -> StatsSummary {
    let mut runs: FxHashMap<&str, RunAgg> = FxHashMap::default();

    for event in events {
        if event.scenario_id != query.scenario_id {
            continue;
        }
        if query.from_ts.is_some_and(|from| event.ts < from)
            || query.to_ts.is_some_and(|to| event.ts > to)
        {
            continue;
        }
        if event.run_id.is_empty() {
            continue;
        }

        let slot_value = event.slots.get(&query.slot).map(stringify);
        match runs.get_mut(event.run_id.as_str()) {
            None => {
                runs.insert(
                    &event.run_id,
                    RunAgg {
                        last_ts: event.ts,
                        last_turn: event.turn,
                        total_steps: event.steps,
                        last_awaiting_kind: event.awaiting_kind.clone(),
                        slot_value,
                        branch_picked: event.branch_picked.clone(),
                    },
                );
            }
            Some(agg) => {
                if event.ts >= agg.last_ts {
                    agg.last_ts = event.ts;
                    agg.last_turn = agg.last_turn.max(event.turn);
                    agg.last_awaiting_kind = event.awaiting_kind.clone();
                    if slot_value.is_some() {
                        agg.slot_value = slot_value;
                    }
                    agg.branch_picked
                        .extend(event.branch_picked.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                agg.total_steps += event.steps;
            }
        }
    }

    let total_runs = runs.len();
    let target_day = query.day.unwrap_or_else(|| Utc::now().date_naive());

    let mut completed_runs = 0;
    let mut dropoff = Dropoff::default();
    let mut slot_dist: FxHashMap<String, usize> = FxHashMap::default();
    let mut branch_dist: FxHashMap<String, usize> = FxHashMap::default();
    let mut by_day: FxHashMap<NaiveDate, usize> = FxHashMap::default();
    let mut hour_buckets = [0usize; 24];
    let mut turns_sum: u64 = 0;
    let mut steps_sum: usize = 0;

    for agg in runs.values() {
        turns_sum += agg.last_turn;
        steps_sum += agg.total_steps;

        match agg.last_awaiting_kind.as_deref() {
            None => {
                completed_runs += 1;
                *by_day.entry(agg.last_ts.date_naive()).or_default() += 1;
                if agg.last_ts.date_naive() == target_day {
                    hour_buckets[agg.last_ts.hour() as usize] += 1;
                }
            }
            Some("slot") => dropoff.slot += 1,
            Some("branch") => dropoff.branch += 1,
            Some(_) => {}
        }

        if let Some(value) = &agg.slot_value {
            *slot_dist.entry(value.clone()).or_default() += 1;
        }
        for choice in agg.branch_picked.values() {
            *branch_dist.entry(choice.clone()).or_default() += 1;
        }
    }

    let mut by_day: Vec<DayCount> = by_day
        .into_iter()
        .map(|(day, runs)| DayCount { day, runs })
        .collect();
    by_day.sort_by_key(|d| d.day);

    let by_hour = hour_buckets
        .iter()
        .enumerate()
        .map(|(hour, runs)| HourCount {
            hour: hour as u32,
            runs: *runs,
        })
        .collect();

    let denom = total_runs as f64;
    StatsSummary {
        scenario_id: query.scenario_id.clone(),
        total_runs,
        completed_runs,
        dropoff,
        slot_dist,
        branch_dist,
        avg_turns: if total_runs == 0 {
            0.0
        } else {
            turns_sum as f64 / denom
        },
        avg_steps: if total_runs == 0 {
            0.0
        } else {
            steps_sum as f64 / denom
        },
        by_day,
        by_hour,
        target_day,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
