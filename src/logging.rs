// src/logging.rs

//! Diagnostic tracing for the agent.
//!
//! Diagnostics go to stderr and are controlled by `RUST_LOG`. The operator
//! console (plans, prompts, step output) is product output on stdout and is
//! not affected by the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Defaults to `warn` when `RUST_LOG` is unset.
///
/// ```bash
/// RUST_LOG=task_agent=debug task-agent --api openai
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
