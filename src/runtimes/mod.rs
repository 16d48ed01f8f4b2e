//! Runtime execution: pause resolution, configuration, and the per-turn
//! run driver.
//!
//! From the driver's perspective a run moves through four states:
//! **Start** (no cursor, no pause) → **Running** (handlers chaining
//! within one call) → **Paused** (a pause descriptor is set; the turn
//! ends) or **Ended** (a terminal transition with nothing awaited).
//! Ended is not globally final — a caller can always start a fresh run.

mod config;
mod resume;
mod runner;

pub use config::RuntimeConfig;
pub use resume::{Resolution, apply_action};
pub use runner::{RunReport, RunRequest, ScenarioRunner};
