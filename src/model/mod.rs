// src/model/mod.rs

use std::fmt;
use tracing::debug;

/// States of the plan → approve → execute → judge loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Generating,
    AwaitingApproval,
    Executing,
    AwaitingVerdict,
    CollectingFeedback,
    Done,
    Aborted,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Done | LoopState::Aborted)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-task session state: the task text as entered, the latest operator
/// feedback and where the loop currently is.
#[derive(Clone, Debug)]
pub struct TaskModel {
    pub task: String,
    feedback: Option<String>,
    state: LoopState,
    attempts: u32,
}

impl TaskModel {
    pub fn new(task: &str) -> Self {
        Self {
            task: task.to_string(),
            feedback: None,
            state: LoopState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Number of plans requested so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn transition(&mut self, next: LoopState) {
        debug!(from = %self.state, to = %next, "loop transition");
        if next == LoopState::Generating {
            self.attempts += 1;
        }
        self.state = next;
    }

    /// Replace (never merge) the feedback carried into the next plan request.
    pub fn record_feedback(&mut self, feedback: String) {
        self.feedback = Some(feedback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_idle_without_feedback() {
        let model = TaskModel::new("make notes");
        assert_eq!(model.state(), LoopState::Idle);
        assert_eq!(model.feedback(), None);
        assert_eq!(model.attempts(), 0);
    }

    #[test]
    fn feedback_is_overwritten_not_appended() {
        let mut model = TaskModel::new("task");
        model.record_feedback("first".into());
        model.record_feedback("second".into());
        assert_eq!(model.feedback(), Some("second"));
    }

    #[test]
    fn each_generation_counts_as_an_attempt() {
        let mut model = TaskModel::new("task");
        model.transition(LoopState::Generating);
        model.transition(LoopState::AwaitingApproval);
        model.transition(LoopState::Generating);
        assert_eq!(model.attempts(), 2);
        assert!(!model.state().is_terminal());
        model.transition(LoopState::Done);
        assert!(model.state().is_terminal());
    }
}
