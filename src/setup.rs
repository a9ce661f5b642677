// src/setup.rs

//! One-time first-run provisioning, recorded by a marker file.

use crate::config::BackendKind;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

pub const SETUP_MARKER: &str = ".setup_complete";
pub const ENV_FILE: &str = ".env";

#[derive(Debug, PartialEq, Eq)]
pub enum SetupStatus {
    AlreadyComplete,
    Completed { saved_keys: Vec<&'static str> },
}

pub fn is_setup_complete(marker: &Path) -> bool {
    marker.exists()
}

/// Run first-time setup unless `marker` already exists.
///
/// Each backend credential not found through `lookup` is asked for via
/// `prompt`; a non-empty answer is appended to `env_file`, an empty one
/// skips that backend. The marker is written last.
pub fn run_setup_if_needed(
    marker: &Path,
    env_file: &Path,
    lookup: impl Fn(&str) -> Option<String>,
    mut prompt: impl FnMut(&str) -> Result<String>,
) -> Result<SetupStatus> {
    if is_setup_complete(marker) {
        debug!(marker = %marker.display(), "setup already complete");
        return Ok(SetupStatus::AlreadyComplete);
    }

    let mut saved_keys = Vec::new();
    for backend in BackendKind::ALL {
        let var = backend.credential_var();
        if lookup(var).is_some_and(|key| !key.trim().is_empty()) {
            info!(var, "credential found in environment");
            continue;
        }

        let key = prompt(&format!("Enter your {var} (or press Enter to skip): "))?;
        let key = key.trim();
        if key.is_empty() {
            info!(var, "credential skipped");
            continue;
        }

        append_env(env_file, var, key)?;
        saved_keys.push(var);
    }

    fs::write(marker, "setup done")
        .with_context(|| format!("write setup marker {}", marker.display()))?;
    Ok(SetupStatus::Completed { saved_keys })
}

fn append_env(env_file: &Path, var: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(env_file)
        .with_context(|| format!("open {}", env_file.display()))?;
    writeln!(file, "\n{var}={value}").with_context(|| format!("write {}", env_file.display()))?;
    info!(var, path = %env_file.display(), "credential saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_marker_skips_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join(SETUP_MARKER);
        fs::write(&marker, "setup done").expect("seed");

        let status = run_setup_if_needed(&marker, &dir.path().join(ENV_FILE), |_| None, |_| {
            panic!("must not prompt")
        })
        .expect("setup");

        assert_eq!(status, SetupStatus::AlreadyComplete);
        assert!(!dir.path().join(ENV_FILE).exists());
    }

    #[test]
    fn prompts_for_missing_keys_and_writes_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join(SETUP_MARKER);
        let env_file = dir.path().join(ENV_FILE);
        let mut asked = Vec::new();

        let status = run_setup_if_needed(
            &marker,
            &env_file,
            |var| (var == "GEMINI_API_KEY").then(|| "present".to_string()),
            |question| {
                asked.push(question.to_string());
                Ok("  sk-new  ".to_string())
            },
        )
        .expect("setup");

        assert_eq!(
            status,
            SetupStatus::Completed {
                saved_keys: vec!["OPENAI_API_KEY"]
            }
        );
        assert_eq!(asked, vec!["Enter your OPENAI_API_KEY (or press Enter to skip): "]);
        assert_eq!(fs::read_to_string(&env_file).expect("env"), "\nOPENAI_API_KEY=sk-new\n");
        assert!(is_setup_complete(&marker));
    }

    #[test]
    fn empty_answers_skip_but_still_finish() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join(SETUP_MARKER);
        let env_file = dir.path().join(ENV_FILE);

        let status =
            run_setup_if_needed(&marker, &env_file, |_| None, |_| Ok(String::new())).expect("setup");

        assert_eq!(status, SetupStatus::Completed { saved_keys: vec![] });
        assert!(!env_file.exists());
        assert_eq!(fs::read_to_string(&marker).expect("marker"), "setup done");
    }
}
