//! Scenario runner
//!
//! Reads YAML scenarios and drives the target through them, producing a
//! [`ScenarioReport`] that names the failing step and its error kind.

mod config;
mod runner;

pub use config::{Scenario, Step};
pub use runner::{run, run_scenario, Exit, ScenarioReport, StepFailure};
