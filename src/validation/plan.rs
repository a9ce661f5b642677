// src/validation/plan.rs

use crate::protocol::{StepCommand, WRITE_FILE_MARKER};
use serde_json::Value;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum PlanValidationError {
    NotAnObject { index: usize },
    MissingField { index: usize, field: &'static str },
    NotAString { index: usize, field: &'static str },
    EmptyCommand { index: usize },
    MalformedWriteFile { index: usize },
}

impl PlanValidationError {
    /// Hard errors reject the plan; the rest are only logged.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PlanValidationError::MalformedWriteFile { .. })
    }
}

impl fmt::Display for PlanValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Steps are numbered from 1, matching the plan display.
        match self {
            PlanValidationError::NotAnObject { index } => {
                write!(f, "step {}: not a JSON object", index + 1)
            }
            PlanValidationError::MissingField { index, field } => {
                write!(f, "step {}: missing field `{field}`", index + 1)
            }
            PlanValidationError::NotAString { index, field } => {
                write!(f, "step {}: field `{field}` must be a string", index + 1)
            }
            PlanValidationError::EmptyCommand { index } => {
                write!(f, "step {}: command is empty", index + 1)
            }
            PlanValidationError::MalformedWriteFile { index } => write!(
                f,
                "step {}: {WRITE_FILE_MARKER} needs both a path and content",
                index + 1
            ),
        }
    }
}

/// Check every step object for a string `description` and a non-empty string `command`.
pub fn validate_plan(plan: &[Value]) -> Vec<PlanValidationError> {
    let mut errors = Vec::new();

    for (index, step) in plan.iter().enumerate() {
        if !step.is_object() {
            errors.push(PlanValidationError::NotAnObject { index });
            continue;
        }

        for field in ["description", "command"] {
            match step.get(field) {
                None => errors.push(PlanValidationError::MissingField { index, field }),
                Some(value) if !value.is_string() => {
                    errors.push(PlanValidationError::NotAString { index, field })
                }
                Some(_) => {}
            }
        }

        let Some(command) = step.get("command").and_then(Value::as_str) else {
            continue;
        };

        if command.trim().is_empty() {
            errors.push(PlanValidationError::EmptyCommand { index });
        } else if StepCommand::parse(command) == StepCommand::MalformedWriteFile {
            errors.push(PlanValidationError::MalformedWriteFile { index });
        }
    }

    errors
}
