// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} not set. Add it to your environment or .env file to use the {backend} backend")]
    MissingCredential { backend: String, var: String },
}

/// Anything that keeps the backend from producing a usable plan.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to {backend} failed: {source}")]
    Transport {
        backend: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} returned status {status}: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("{backend} response missing generated text")]
    MissingText { backend: String },

    #[error("no JSON plan found in reply")]
    NoPlanFound { raw: String },

    #[error("reply JSON is not a plan: {reason}")]
    Malformed { reason: String, raw: String },

    #[error("plan failed validation: {}", .problems.join("; "))]
    InvalidPlan { problems: Vec<String>, raw: String },
}

impl GenerationError {
    /// The raw reply text, when the failure happened after the backend answered.
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            GenerationError::NoPlanFound { raw }
            | GenerationError::Malformed { raw, .. }
            | GenerationError::InvalidPlan { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("error writing file {}: {source}", .path.display())]
pub struct WriteFileError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Why a single plan step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("invalid WRITE_FILE command format: {0}")]
    Format(String),

    #[error(transparent)]
    Write(#[from] WriteFileError),

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting on `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", exit_message(.code, .stderr))]
    Exit { code: Option<i32>, stderr: String },

    #[error("command timed out after {secs}s")]
    TimedOut { secs: u64 },
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    match (code, stderr.is_empty()) {
        (_, false) => stderr.to_string(),
        (Some(code), true) => format!("exited with code {code}"),
        (None, true) => "terminated by signal".to_string(),
    }
}

/// Failure to obtain an answer from the operator.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("operation cancelled by user")]
    Cancelled,

    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_error_prefers_stderr() {
        let err = StepError::Exit {
            code: Some(2),
            stderr: "ls: cannot access 'nope'\n".into(),
        };
        assert_eq!(err.to_string(), "ls: cannot access 'nope'");

        let err = StepError::Exit {
            code: Some(3),
            stderr: "  ".into(),
        };
        assert_eq!(err.to_string(), "exited with code 3");
    }

    #[test]
    fn wait_failure_is_not_reported_as_a_failed_start() {
        let err = StepError::Wait {
            command: "make -j8".into(),
            source: std::io::Error::from(std::io::ErrorKind::Interrupted),
        };
        let shown = err.to_string();
        assert!(shown.starts_with("failed waiting on `make -j8`: "), "{shown}");
        assert!(!shown.contains("failed to start"));
    }

    #[test]
    fn invalid_plan_lists_problems() {
        let err = GenerationError::InvalidPlan {
            problems: vec!["step 1: missing field `command`".into(), "step 2: empty".into()],
            raw: "[]".into(),
        };
        assert_eq!(
            err.to_string(),
            "plan failed validation: step 1: missing field `command`; step 2: empty"
        );
        assert_eq!(err.raw_reply(), Some("[]"));
    }
}
