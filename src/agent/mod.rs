// src/agent/mod.rs

//! The plan → approve → execute → judge → refeedback loop.

pub mod console;
pub mod executor;

use crate::error::{GenerationError, OperatorError};
use crate::model::{LoopState, TaskModel};
use crate::protocol::planner::Planner;
use crate::protocol::{Plan, StepResult};
pub use executor::{ExecutionMode, StepExecutor, StepObserver};
use tracing::{debug, info};

/// The human in the loop. Every question may fail with
/// [`OperatorError::Cancelled`], which aborts the run.
pub trait Operator: StepObserver {
    fn show_plan(&mut self, plan: &Plan);
    fn approve_plan(&mut self) -> Result<bool, OperatorError>;
    fn confirm_success(&mut self) -> Result<bool, OperatorError>;
    fn collect_feedback(&mut self) -> Result<String, OperatorError>;
    /// Status lines from the loop itself.
    fn notify(&mut self, event: LoopEvent<'_>);
}

/// Things the loop tells the operator about outside of questions.
#[derive(Debug)]
pub enum LoopEvent<'a> {
    Processing { task: &'a str },
    GenerationFailed(&'a GenerationError),
    EmptyPlan,
    Rejected,
    Refining,
    Completed,
}

#[derive(Debug)]
pub enum AbortReason {
    /// The backend produced no usable plan.
    NoPlan(Option<GenerationError>),
    Rejected,
    Cancelled,
    Console(std::io::Error),
}

#[derive(Debug)]
pub enum Outcome {
    Done { attempts: u32 },
    Aborted(AbortReason),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }
}

pub struct ReviewLoop<P, O> {
    planner: P,
    executor: StepExecutor,
    operator: O,
    last_results: Vec<StepResult>,
}

impl<P: Planner, O: Operator> ReviewLoop<P, O> {
    pub fn new(planner: P, executor: StepExecutor, operator: O) -> Self {
        Self {
            planner,
            executor,
            operator,
            last_results: Vec::new(),
        }
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Results of the most recent execution, up to and including the first failure.
    pub fn last_results(&self) -> &[StepResult] {
        &self.last_results
    }

    /// Drive `task` until the operator confirms success, rejects a plan,
    /// or cancels. There is no retry limit.
    pub fn run(&mut self, task: &str) -> Outcome {
        let mut model = TaskModel::new(task);
        let outcome = match self.drive(&mut model) {
            Ok(outcome) => outcome,
            Err(OperatorError::Cancelled) => Outcome::Aborted(AbortReason::Cancelled),
            Err(OperatorError::Io(err)) => Outcome::Aborted(AbortReason::Console(err)),
        };

        let terminal = if outcome.is_done() {
            LoopState::Done
        } else {
            LoopState::Aborted
        };
        if model.state() != terminal {
            model.transition(terminal);
        }
        info!(attempts = model.attempts(), outcome = ?outcome, "task finished");
        outcome
    }

    fn drive(&mut self, model: &mut TaskModel) -> Result<Outcome, OperatorError> {
        loop {
            model.transition(LoopState::Generating);
            self.operator.notify(LoopEvent::Processing { task: &model.task });

            let plan = match self.planner.generate(&model.task, model.feedback()) {
                Ok(plan) if !plan.is_empty() => plan,
                Ok(_) => {
                    self.operator.notify(LoopEvent::EmptyPlan);
                    return Ok(abort(model, AbortReason::NoPlan(None)));
                }
                Err(err) => {
                    self.operator.notify(LoopEvent::GenerationFailed(&err));
                    return Ok(abort(model, AbortReason::NoPlan(Some(err))));
                }
            };

            model.transition(LoopState::AwaitingApproval);
            self.operator.show_plan(&plan);
            if !self.operator.approve_plan()? {
                self.operator.notify(LoopEvent::Rejected);
                return Ok(abort(model, AbortReason::Rejected));
            }

            model.transition(LoopState::Executing);
            self.last_results = self.executor.execute_plan(&plan, &mut self.operator);
            debug!(
                ran = self.last_results.len(),
                planned = plan.len(),
                "plan executed"
            );

            // Success is always the operator's call, whatever the results say.
            model.transition(LoopState::AwaitingVerdict);
            if self.operator.confirm_success()? {
                model.transition(LoopState::Done);
                self.operator.notify(LoopEvent::Completed);
                return Ok(Outcome::Done {
                    attempts: model.attempts(),
                });
            }

            model.transition(LoopState::CollectingFeedback);
            let feedback = self.operator.collect_feedback()?;
            model.record_feedback(feedback);
            self.operator.notify(LoopEvent::Refining);
        }
    }
}

fn abort(model: &mut TaskModel, reason: AbortReason) -> Outcome {
    model.transition(LoopState::Aborted);
    Outcome::Aborted(reason)
}
