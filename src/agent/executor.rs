// src/agent/executor.rs

use crate::config::Config;
use crate::error::StepError;
use crate::protocol::{Plan, PlanStep, StepCommand, StepResult};
use crate::tools::run_command::{run_captured, run_interactive};
use crate::tools::{is_interactive, write_file};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// How a step is going to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    WriteFile,
    Interactive,
    Captured,
    /// Malformed pseudo-command; fails without running anything.
    Invalid,
}

impl ExecutionMode {
    pub fn of(step: &PlanStep) -> Self {
        match step.parse_command() {
            StepCommand::WriteFile { .. } => ExecutionMode::WriteFile,
            StepCommand::MalformedWriteFile => ExecutionMode::Invalid,
            StepCommand::Shell(cmd) if is_interactive(cmd) => ExecutionMode::Interactive,
            StepCommand::Shell(_) => ExecutionMode::Captured,
        }
    }
}

/// Hooks around each step, used for live console output.
pub trait StepObserver {
    fn step_started(&mut self, _number: usize, _step: &PlanStep, _mode: ExecutionMode) {}
    fn step_finished(&mut self, _number: usize, _mode: ExecutionMode, _result: &StepResult) {}
}

impl StepObserver for () {}

/// Runs plan steps one at a time inside a working directory.
#[derive(Clone, Debug)]
pub struct StepExecutor {
    workdir: PathBuf,
    command_timeout: Option<Duration>,
}

impl StepExecutor {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            command_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.workdir.clone()).with_command_timeout(config.command_timeout)
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Run a single step. Failures are folded into the returned result.
    pub fn execute(&self, step: &PlanStep) -> StepResult {
        self.execute_as(step, ExecutionMode::of(step))
    }

    fn execute_as(&self, step: &PlanStep, mode: ExecutionMode) -> StepResult {
        match self.run(step, mode) {
            Ok(detail) => StepResult::success(step, detail),
            Err(err) => {
                warn!(description = %step.description, %err, "step failed");
                StepResult::failure(step, err.to_string())
            }
        }
    }

    /// Run steps in order, stopping after the first failure.
    ///
    /// The failing step's result is the last element; later steps never run.
    pub fn execute_plan(&self, plan: &Plan, observer: &mut dyn StepObserver) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(plan.len());

        for (i, step) in plan.steps.iter().enumerate() {
            let number = i + 1;
            let mode = ExecutionMode::of(step);
            observer.step_started(number, step, mode);

            let result = self.execute_as(step, mode);
            observer.step_finished(number, mode, &result);

            let failed = !result.succeeded;
            results.push(result);
            if failed {
                debug!(number, remaining = plan.len() - number, "halting plan after failure");
                break;
            }
        }

        results
    }

    fn run(&self, step: &PlanStep, mode: ExecutionMode) -> Result<String, StepError> {
        match (mode, step.parse_command()) {
            (ExecutionMode::WriteFile, StepCommand::WriteFile { path, content }) => {
                write_file(&self.workdir.join(path), content)?;
                Ok(format!("Created {path}"))
            }
            (ExecutionMode::Interactive, _) => {
                run_interactive(&step.command, &self.workdir)?;
                Ok("Interactive execution".to_string())
            }
            (ExecutionMode::Captured, _) => {
                let output = run_captured(&step.command, &self.workdir, self.command_timeout)?;
                Ok(output.stdout)
            }
            (ExecutionMode::WriteFile | ExecutionMode::Invalid, _) => {
                Err(StepError::Format(step.command.clone()))
            }
        }
    }
}
