// src/protocol/mod.rs

use serde::{Deserialize, Serialize};

pub mod planner;

/// Prefix of the pseudo-command the executor handles itself instead of the shell.
pub const WRITE_FILE_MARKER: &str = "WRITE_FILE:";

/// One description + command pair produced by the planner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    pub command: String,
}

impl PlanStep {
    pub fn new(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            command: command.into(),
        }
    }

    /// Interpret the command string.
    pub fn parse_command(&self) -> StepCommand<'_> {
        StepCommand::parse(&self.command)
    }
}

/// How the executor should treat a step's command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepCommand<'a> {
    /// `WRITE_FILE:<path>:<content>`; the content keeps any further `:`.
    WriteFile { path: &'a str, content: &'a str },
    /// `WRITE_FILE:` without both a path and a content field.
    MalformedWriteFile,
    Shell(&'a str),
}

impl<'a> StepCommand<'a> {
    pub fn parse(command: &'a str) -> Self {
        let Some(rest) = command.strip_prefix(WRITE_FILE_MARKER) else {
            return StepCommand::Shell(command);
        };
        match rest.split_once(':') {
            Some((path, content)) => StepCommand::WriteFile { path, content },
            None => StepCommand::MalformedWriteFile,
        }
    }
}

/// Ordered steps; order is execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Outcome of running one step.
///
/// `detail` holds captured stdout on success and the stderr or diagnostic
/// message on failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepResult {
    pub step: PlanStep,
    pub succeeded: bool,
    pub detail: String,
}

impl StepResult {
    pub fn success(step: &PlanStep, detail: impl Into<String>) -> Self {
        Self {
            step: step.clone(),
            succeeded: true,
            detail: detail.into(),
        }
    }

    pub fn failure(step: &PlanStep, detail: impl Into<String>) -> Self {
        Self {
            step: step.clone(),
            succeeded: false,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_splits_on_first_two_colons_only() {
        let cmd = StepCommand::parse("WRITE_FILE:src/main.c:int x = 1; // a:b:c");
        assert_eq!(
            cmd,
            StepCommand::WriteFile {
                path: "src/main.c",
                content: "int x = 1; // a:b:c",
            }
        );
    }

    #[test]
    fn write_file_allows_empty_content() {
        assert_eq!(
            StepCommand::parse("WRITE_FILE:empty.txt:"),
            StepCommand::WriteFile {
                path: "empty.txt",
                content: "",
            }
        );
    }

    #[test]
    fn write_file_without_content_field_is_malformed() {
        assert_eq!(
            StepCommand::parse("WRITE_FILE:only-a-path"),
            StepCommand::MalformedWriteFile
        );
        assert_eq!(StepCommand::parse("WRITE_FILE:"), StepCommand::MalformedWriteFile);
    }

    #[test]
    fn anything_else_is_a_shell_command() {
        assert_eq!(StepCommand::parse("gcc -o add add.c"), StepCommand::Shell("gcc -o add add.c"));
        // marker is case sensitive and must lead
        assert_eq!(
            StepCommand::parse(" WRITE_FILE:a:b"),
            StepCommand::Shell(" WRITE_FILE:a:b")
        );
    }
}
