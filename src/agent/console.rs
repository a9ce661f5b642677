// src/agent/console.rs

//! Plain-text operator console over stdin/stdout.

use crate::agent::executor::{ExecutionMode, StepObserver};
use crate::agent::{LoopEvent, Operator};
use crate::config::DEFAULT_PREVIEW_LEN;
use crate::error::OperatorError;
use crate::protocol::{Plan, PlanStep, StepCommand, StepResult};
use colored::Colorize;
use std::io::{self, BufRead, Write};

const RULE_WIDTH: usize = 50;

pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
    preview_len: usize,
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            preview_len: DEFAULT_PREVIEW_LEN,
        }
    }

    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `prompt` and read one line. End of input means the operator is gone.
    pub fn ask(&mut self, prompt: &str) -> Result<String, OperatorError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(OperatorError::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the reply is a yes or a no.
    pub fn ask_yes_no(&mut self, prompt: &str) -> Result<bool, OperatorError> {
        loop {
            match self.ask(prompt)?.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    fn render_plan(&mut self, plan: &Plan) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let thin = "-".repeat(RULE_WIDTH);

        writeln!(self.output, "\n{}", "📋 Generated Task Plan:".bold())?;
        writeln!(self.output, "{rule}")?;
        for (i, step) in plan.steps.iter().enumerate() {
            writeln!(self.output, "Step {}:", i + 1)?;
            writeln!(self.output, "  Description: {}", step.description)?;
            match step.parse_command() {
                StepCommand::WriteFile { path, content } => {
                    writeln!(self.output, "  Command: Write content to {path}")?;
                    writeln!(
                        self.output,
                        "  Content preview: {}",
                        preview(content, self.preview_len)
                    )?;
                }
                _ => writeln!(self.output, "  Command: {}", step.command)?,
            }
            writeln!(self.output, "{thin}")?;
        }
        Ok(())
    }

    fn render_start(&mut self, number: usize, step: &PlanStep, mode: ExecutionMode) -> io::Result<()> {
        writeln!(self.output, "\nExecuting Step {number}: {}", step.description)?;
        match (mode, step.parse_command()) {
            (ExecutionMode::WriteFile, StepCommand::WriteFile { path, .. }) => {
                writeln!(self.output, "Writing content to {path}")?;
            }
            (ExecutionMode::Invalid, _) => {}
            _ => writeln!(self.output, "Command: {}", step.command)?,
        }
        if mode == ExecutionMode::Interactive {
            writeln!(self.output, "\n--- Program Output Start ---")?;
        }
        // Interactive children share this terminal; get our text out first.
        self.output.flush()
    }

    fn render_finish(&mut self, mode: ExecutionMode, result: &StepResult) -> io::Result<()> {
        if mode == ExecutionMode::Interactive {
            writeln!(self.output, "--- Program Output End ---\n")?;
        }

        if !result.succeeded {
            writeln!(self.output, "{}", "❌ Step failed:".red())?;
            for line in result.detail.trim().lines() {
                writeln!(self.output, "  {line}")?;
            }
            return Ok(());
        }

        match mode {
            ExecutionMode::WriteFile => {
                writeln!(self.output, "{}", format!("✅ {}", result.detail).green())?
            }
            ExecutionMode::Captured => {
                writeln!(self.output, "{}", "✅ Success".green())?;
                let stdout = result.detail.trim();
                if !stdout.is_empty() {
                    writeln!(self.output, "Output:")?;
                    for line in stdout.lines() {
                        writeln!(self.output, "  {line}")?;
                    }
                }
            }
            ExecutionMode::Interactive | ExecutionMode::Invalid => {}
        }
        Ok(())
    }
}

/// First `max` characters of `content`, with `...` when something was cut.
pub fn preview(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

impl<R: BufRead, W: Write> StepObserver for ConsoleOperator<R, W> {
    fn step_started(&mut self, number: usize, step: &PlanStep, mode: ExecutionMode) {
        // Console trouble must not stop the plan; the step still runs.
        let _ = self.render_start(number, step, mode);
    }

    fn step_finished(&mut self, _number: usize, mode: ExecutionMode, result: &StepResult) {
        let _ = self.render_finish(mode, result);
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn show_plan(&mut self, plan: &Plan) {
        let _ = self.render_plan(plan);
    }

    fn approve_plan(&mut self) -> Result<bool, OperatorError> {
        self.ask_yes_no("\nDo you approve this plan? (y/n): ")
    }

    fn confirm_success(&mut self) -> Result<bool, OperatorError> {
        self.ask_yes_no("\nWas the task successfully completed? (y/n): ")
    }

    fn collect_feedback(&mut self) -> Result<String, OperatorError> {
        writeln!(
            self.output,
            "\nPlease explain why the task failed or what needs to be fixed:"
        )?;
        self.ask("> ")
    }

    fn notify(&mut self, event: LoopEvent<'_>) {
        let line = match event {
            LoopEvent::Processing { task } => format!("\n🤖 Processing task: {task}"),
            LoopEvent::GenerationFailed(err) => format!(
                "{} {err}\nFailed to generate a plan. Please try again with a clearer task description.",
                "Error:".red()
            ),
            LoopEvent::EmptyPlan => {
                "Failed to generate a plan. Please try again with a clearer task description."
                    .to_string()
            }
            LoopEvent::Rejected => "Plan rejected. Exiting.".to_string(),
            LoopEvent::Refining => "Refining approach based on feedback...".to_string(),
            LoopEvent::Completed => "✅ Task completed successfully!".green().to_string(),
        };
        let _ = writeln!(self.output, "{line}");
    }
}
