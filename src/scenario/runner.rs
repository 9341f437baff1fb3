//! Scenario runner implementation
//!
//! Executes a scenario against a [`Driver`] step by step, printing progress
//! and always quitting the target at the end, whatever happened.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::common::paths::Workspace;
use crate::common::{Error, Result};
use crate::driver::{Anchor, Driver, FieldEdit, Session, Termination};
use crate::input::InputSink;
use crate::locator::Locator;

use super::config::{Scenario, Step};

/// Result of a scenario run
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    /// The step that ended the run, if any
    pub failure: Option<StepFailure>,
    /// Rejected dialog values the run continued past
    pub rejections: Vec<StepFailure>,
    /// How the target was shut down; `None` if it never became ready
    pub termination: Option<Exit>,
}

/// A step and the error it produced
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    /// 1-based step number, 0 for setup
    pub step: usize,
    pub action: String,
    pub kind: String,
    pub message: String,
}

impl StepFailure {
    fn new(step: usize, action: &str, error: &Error) -> Self {
        Self {
            step,
            action: action.to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Serializable summary of a [`Termination`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exit {
    pub forced: bool,
    pub code: Option<i32>,
}

impl From<Termination> for Exit {
    fn from(t: Termination) -> Self {
        let code = match t {
            Termination::Graceful(status) | Termination::Terminated(status) => status.code(),
            Termination::Killed => None,
        };
        Self {
            forced: t.is_forced(),
            code,
        }
    }
}

impl ScenarioReport {
    /// Pretty-printed JSON for CI artifacts
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`
    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Load a scenario from a YAML file and run it
pub async fn run_scenario<L: Locator, I: InputSink>(
    driver: &mut Driver<L, I>,
    workspace: &Workspace,
    path: &Path,
) -> Result<ScenarioReport> {
    let scenario = Scenario::load(path)?;
    run(driver, workspace, &scenario).await
}

/// Run a scenario from launch to quit
///
/// Missing reference images are returned as an error before the target is
/// started. Everything after that, including a failed launch, ends up in the
/// report.
pub async fn run<L: Locator, I: InputSink>(
    driver: &mut Driver<L, I>,
    workspace: &Workspace,
    scenario: &Scenario,
) -> Result<ScenarioReport> {
    let steps_total = scenario.steps.len();
    let mut report = ScenarioReport {
        name: scenario.name.clone(),
        passed: false,
        steps_run: 0,
        steps_total,
        failure: None,
        rejections: Vec::new(),
        termination: None,
    };

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let mut wanted = scenario.reference_keys();
    for key in &driver.config().polling.watch {
        if !wanted.contains(key) {
            wanted.push(key.clone());
        }
    }
    driver.check_references(wanted.iter().map(String::as_str))?;

    println!("\n{}", "Starting target...".cyan());
    let (mut session, anchor) = match driver.setup(workspace, &scenario.launch_flags).await {
        Ok(started) => started,
        Err(e) => {
            println!("  {} Setup: {}", "✗".red(), e);
            report.failure = Some(StepFailure::new(0, "setup", &e));
            return Ok(report);
        }
    };
    println!("  {} Target ready (pid {:?})", "✓".green(), session.pid());

    println!("\n{}", "Steps:".cyan());
    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;
        report.steps_run = step_num;

        match execute_step(driver, &mut session, &anchor, step).await {
            Ok(()) => {
                println!("  {} Step {}: {}", "✓".green(), step_num, step.summary().dimmed());
            }
            Err(e) if !e.is_fatal() => {
                println!(
                    "  {} Step {}: {} ({})",
                    "!".yellow(),
                    step_num,
                    step.summary().dimmed(),
                    e.to_string().yellow()
                );
                report
                    .rejections
                    .push(StepFailure::new(step_num, step.action(), &e));
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
                tracing::error!(step = step_num, kind = e.kind(), "Scenario step failed: {}", e);
                report.failure = Some(StepFailure::new(step_num, step.action(), &e));
                break;
            }
        }
    }

    report.termination = shutdown(driver, session).await;
    report.passed = report.failure.is_none();

    if report.passed {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            "Scenario Passed".green().bold()
        );
    } else {
        println!("\n{} {}\n", "✗".red().bold(), "Scenario Failed".red().bold());
    }
    Ok(report)
}

async fn shutdown<L: Locator, I: InputSink>(
    driver: &mut Driver<L, I>,
    session: Session,
) -> Option<Exit> {
    match driver.quit(session).await {
        Ok(termination) => {
            let exit = Exit::from(termination);
            if exit.forced {
                println!("  {} Target had to be stopped forcibly", "!".yellow());
            }
            Some(exit)
        }
        Err(e) => {
            tracing::warn!("Quit failed: {}", e);
            None
        }
    }
}

/// Execute a single scenario step
async fn execute_step<L: Locator, I: InputSink>(
    driver: &mut Driver<L, I>,
    session: &mut Session,
    anchor: &Anchor,
    step: &Step,
) -> Result<()> {
    match step {
        Step::EnterMode { mode } => driver.enter_mode(session, mode).await,
        Step::SelectShapeType { type_name } => driver.select_shape_type(session, type_name).await,
        Step::ChangeAttributeUsingDialog {
            field,
            selector,
            expect,
        } => {
            let result = driver
                .change_attribute_using_dialog(session, *field, *selector)
                .await;
            match (result, expect) {
                (Err(Error::ValidationRejected { .. }), Some(FieldEdit::Rejected)) => Ok(()),
                (Ok(()), Some(FieldEdit::Rejected)) => Err(Error::TestAssertion(format!(
                    "Dialog for attribute {} expected to reject entry {}, but accepted it",
                    field, selector
                ))),
                (Err(Error::ValidationRejected { .. }), Some(FieldEdit::Accepted)) => {
                    Err(Error::TestAssertion(format!(
                        "Dialog for attribute {} expected to accept entry {}, but rejected it",
                        field, selector
                    )))
                }
                (result, _) => result,
            }
        }
        Step::Click { dx, dy } => driver.click_at(session, anchor, *dx, *dy).await,
        Step::Drag { from, to } => driver.drag(session, anchor, *from, *to).await,
        Step::SetField {
            field,
            value,
            expect,
        } => {
            let edit = driver
                .set_field_value_directly(session, *field, value)
                .await?;
            match expect {
                Some(expected) if *expected != edit => Err(Error::TestAssertion(format!(
                    "Field {} = {:?}: expected {:?}, got {:?}",
                    field, value, expected, edit
                ))),
                _ => Ok(()),
            }
        }
        Step::ModifyBoolAttribute { field } => driver.modify_bool_attribute(session, *field).await,
        Step::SetZoom { zoom, x, y } => driver.set_zoom(session, *zoom, *x, *y).await,
        Step::Undo { count } => driver.undo(session, *count).await,
        Step::Redo { count } => driver.redo(session, *count).await,
        Step::SaveShapes => driver.save_shapes(session).await,
        Step::SaveNetwork => driver.save_network(session).await,
        Step::SaveAdditionals => driver.save_additionals(session).await,
    }
}
