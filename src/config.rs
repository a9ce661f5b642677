// src/config.rs

//! Runtime configuration assembled from CLI flags and environment secrets.

use crate::error::ConfigError;
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which text-generation service produces plans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    #[default]
    Gemini,
    Openai,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Gemini, BackendKind::Openai];

    /// Environment variable holding this backend's API key.
    pub fn credential_var(self) -> &'static str {
        match self {
            BackendKind::Gemini => "GEMINI_API_KEY",
            BackendKind::Openai => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini-2.0-flash",
            BackendKind::Openai => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gemini => f.write_str("gemini"),
            BackendKind::Openai => f.write_str("openai"),
        }
    }
}

/// Everything the agent needs after startup.
#[derive(Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub api_key: String,
    pub model: Option<String>,
    pub workdir: PathBuf,
    /// Bound on captured commands. `None` waits forever.
    pub command_timeout: Option<Duration>,
    /// Bound on backend requests. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Characters of `WRITE_FILE` content shown when displaying a plan.
    pub preview_len: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("backend", &self.backend)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("workdir", &self.workdir)
            .field("command_timeout", &self.command_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("preview_len", &self.preview_len)
            .finish()
    }
}

pub const DEFAULT_PREVIEW_LEN: usize = 100;

impl Config {
    /// Resolve the credential for `backend` through `lookup`.
    ///
    /// A missing or blank key is a [`ConfigError::MissingCredential`].
    pub fn resolve(
        backend: BackendKind,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = backend.credential_var();
        let api_key = lookup(var)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential {
                backend: backend.to_string(),
                var: var.to_string(),
            })?;

        Ok(Self {
            backend,
            api_key,
            model: None,
            workdir: PathBuf::from("."),
            command_timeout: None,
            request_timeout: None,
            preview_len: DEFAULT_PREVIEW_LEN,
        })
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_workdir(mut self, workdir: PathBuf) -> Self {
        self.workdir = workdir;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}
