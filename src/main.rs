use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use task_agent::agent::console::ConsoleOperator;
use task_agent::agent::{AbortReason, Outcome, ReviewLoop, StepExecutor};
use task_agent::config::{BackendKind, Config, DEFAULT_PREVIEW_LEN};
use task_agent::error::OperatorError;
use task_agent::logging;
use task_agent::protocol::planner::LlmPlanner;
use task_agent::setup::{self, ENV_FILE, SETUP_MARKER, SetupStatus};
use task_agent::tools::llm::backend_from_config;

/// Task finished and the operator confirmed success.
const EXIT_OK: i32 = 0;
/// Startup or configuration failure.
const EXIT_ERROR: i32 = 1;
/// Loop aborted: no plan, plan rejected, or console failure.
const EXIT_ABORTED: i32 = 2;

const CANCELLED: &str = "\nOperation cancelled by user. Exiting.";

#[derive(Parser)]
#[command(
    name = "task-agent",
    version,
    about = "Plan shell commands for a task with an LLM, run them after approval, retry with feedback"
)]
struct Cli {
    /// Task description. Read from stdin when omitted.
    task: Vec<String>,

    /// Text-generation backend to plan with.
    #[arg(long, value_enum, default_value_t = BackendKind::Gemini)]
    api: BackendKind,

    /// Model name; defaults to the backend's standard model.
    #[arg(long)]
    model: Option<String>,

    /// Directory commands run in and WRITE_FILE paths resolve against.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Kill captured commands after this many seconds.
    #[arg(long)]
    command_timeout_secs: Option<u64>,

    /// Give up on backend requests after this many seconds.
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Characters of file content shown when displaying a plan.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_LEN)]
    preview_len: usize,

    /// Marker file recording that first-run setup happened.
    #[arg(long, default_value = SETUP_MARKER)]
    setup_marker: PathBuf,

    /// File API keys are loaded from and saved to.
    #[arg(long, default_value = ENV_FILE)]
    env_file: PathBuf,

    /// Skip first-run setup even if the marker is missing.
    #[arg(long)]
    skip_setup: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red(), err);
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init();

    ctrlc::set_handler(|| {
        println!("{CANCELLED}");
        std::process::exit(EXIT_OK);
    })
    .context("install Ctrl-C handler")?;

    dotenvy::from_path(&cli.env_file).ok();

    println!("{}", "=".repeat(50));
    println!("{}", "🤖 AI Task Agent".bold());
    println!("{}", "=".repeat(50));

    let mut console = ConsoleOperator::stdio().with_preview_len(cli.preview_len);

    if !cli.skip_setup {
        let status = match setup::run_setup_if_needed(
            &cli.setup_marker,
            &cli.env_file,
            env_lookup,
            |q| Ok(console.ask(q)?),
        ) {
            Ok(status) => status,
            Err(err) if is_cancellation(&err) => {
                println!("{CANCELLED}");
                return Ok(EXIT_OK);
            }
            Err(err) => return Err(err),
        };
        if let SetupStatus::Completed { saved_keys } = status {
            if !saved_keys.is_empty() {
                dotenvy::from_path_override(&cli.env_file)
                    .with_context(|| format!("reload {}", cli.env_file.display()))?;
            }
            println!("{}", "✅ Setup complete!".green());
        }
    }

    let config = Config::resolve(cli.api, env_lookup)?
        .with_model(cli.model)
        .with_workdir(cli.workdir)
        .with_command_timeout(cli.command_timeout_secs.map(Duration::from_secs))
        .with_request_timeout(cli.request_timeout_secs.map(Duration::from_secs))
        .with_preview_len(cli.preview_len);
    tracing::debug!(?config, "configuration resolved");

    let backend = backend_from_config(&config).context("build HTTP client")?;
    let planner = LlmPlanner::new(backend);
    let executor = StepExecutor::from_config(&config);

    let task = if cli.task.is_empty() {
        match console.ask("Enter your task description: ") {
            Ok(task) => task,
            Err(OperatorError::Cancelled) => {
                println!("{CANCELLED}");
                return Ok(EXIT_OK);
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        cli.task.join(" ")
    };
    if task.trim().is_empty() {
        bail!("task description is empty");
    }

    let mut review = ReviewLoop::new(planner, executor, console);
    let code = match review.run(&task) {
        Outcome::Done { .. } => EXIT_OK,
        Outcome::Aborted(AbortReason::Cancelled) => {
            println!("{CANCELLED}");
            EXIT_OK
        }
        Outcome::Aborted(AbortReason::Console(err)) => {
            return Err(err).context("operator console failed");
        }
        Outcome::Aborted(AbortReason::NoPlan(_) | AbortReason::Rejected) => EXIT_ABORTED,
    };
    Ok(code)
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// The operator walked away at a prompt somewhere under `err`.
fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<OperatorError>(),
            Some(OperatorError::Cancelled)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_gemini_and_stdin_task() {
        let cli = Cli::parse_from(["task-agent"]);
        assert_eq!(cli.api, BackendKind::Gemini);
        assert!(cli.task.is_empty());
        assert_eq!(cli.preview_len, DEFAULT_PREVIEW_LEN);
        assert_eq!(cli.setup_marker, PathBuf::from(".setup_complete"));
        assert!(cli.command_timeout_secs.is_none());
    }

    #[test]
    fn parses_backend_and_inline_task() {
        let cli = Cli::parse_from([
            "task-agent",
            "--api",
            "openai",
            "--command-timeout-secs",
            "30",
            "create",
            "notes.txt",
        ]);
        assert_eq!(cli.api, BackendKind::Openai);
        assert_eq!(cli.command_timeout_secs, Some(30));
        assert_eq!(cli.task.join(" "), "create notes.txt");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["task-agent", "--api", "claude"]).is_err());
    }

    #[test]
    fn end_of_input_during_setup_is_a_cancellation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join(SETUP_MARKER);
        let env_file = dir.path().join(ENV_FILE);
        let mut console =
            ConsoleOperator::new(std::io::Cursor::new(Vec::<u8>::new()), Vec::<u8>::new());

        let err = setup::run_setup_if_needed(&marker, &env_file, |_| None, |q| Ok(console.ask(q)?))
            .expect_err("no answer");

        assert!(is_cancellation(&err));
        assert!(!marker.exists());
    }

    #[test]
    fn other_failures_are_not_cancellations() {
        let err = anyhow::Error::new(OperatorError::Io(std::io::ErrorKind::BrokenPipe.into()))
            .context("ask for key");
        assert!(!is_cancellation(&err));

        let err = anyhow::Error::new(OperatorError::Cancelled).context("ask for key");
        assert!(is_cancellation(&err));
    }
}
