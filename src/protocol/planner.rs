// src/protocol/planner.rs

use crate::error::GenerationError;
use crate::protocol::{Plan, PlanStep};
use crate::tools::LlmBackend;
use crate::validation::validate_plan;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Start of something that looks like a JSON array of objects.
static ARRAY_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\{").expect("static regex is valid"));

/// Trait for turning a task description (plus feedback on the last attempt) into a plan.
pub trait Planner {
    fn generate(&self, task: &str, feedback: Option<&str>) -> Result<Plan, GenerationError>;
}

/// Shell flavour the generated commands should target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellDialect {
    Cmd,
    Bash,
}

impl ShellDialect {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            ShellDialect::Cmd
        } else {
            ShellDialect::Bash
        }
    }

    fn hint(self) -> &'static str {
        match self {
            ShellDialect::Cmd => {
                "This is a Windows system using cmd.exe. Avoid using bash-specific syntax."
            }
            ShellDialect::Bash => "This is a Unix-like system. Use standard bash commands.",
        }
    }
}

const FILE_CREATION_HINT: &str = "For file creation: Use 'touch' only for empty files. \
For files that need content, use 'WRITE_FILE:filename:content' as a special command. \
For C/C++ programs, always include 'fflush(stdout);' after printf statements without newlines to ensure prompts are displayed. \
For C++ programs, use 'std::cout << ... << std::flush;' to ensure output is displayed immediately.";

/// Task text, then the latest feedback (if any), then the fixed notes.
pub fn task_context(task: &str, feedback: Option<&str>, dialect: ShellDialect) -> String {
    let mut context = task.to_string();
    if let Some(feedback) = feedback.filter(|f| !f.trim().is_empty()) {
        context.push_str("\n\nPrevious attempt feedback: ");
        context.push_str(feedback);
    }
    context.push_str("\n\nImportant notes: ");
    context.push_str(FILE_CREATION_HINT);
    context.push(' ');
    context.push_str(dialect.hint());
    context
}

/// The full instruction sent to the backend.
pub fn build_prompt(task: &str, feedback: Option<&str>, dialect: ShellDialect) -> String {
    let context = task_context(task, feedback, dialect);
    format!(
        r#"You are an AI agent that generates executable commands for a computer.
Based on the task description, generate a sequence of commands to achieve the task.

IMPORTANT GUIDELINES:
1. For empty files use: 'touch filename'
2. For files that need content, use this special format:
   WRITE_FILE:filename:file_content_here
   (This is a special command our system understands)
3. For C programs:
   - Always add 'fflush(stdout);' after printf statements without newlines
   - Example: printf("Enter number: "); fflush(stdout);
4. For C++ programs:
   - Use 'std::cout << "Prompt: " << std::flush;' for immediate display
5. Include proper compilation commands with appropriate flags

For each step include:
1. A description of what the command does
2. The exact command to run

Task: {context}

Format your response as a JSON array of objects with 'description' and 'command' keys.
Example:
[
    {{"description": "Create a directory for the project", "command": "mkdir project"}},
    {{"description": "Create a C file with proper output handling", "command": "WRITE_FILE:add.c:#include <stdio.h>\n\nint main() {{\n    int a, b;\n    printf(\"Enter first number: \"); fflush(stdout);\n    scanf(\"%d\", &a);\n    printf(\"Enter second number: \"); fflush(stdout);\n    scanf(\"%d\", &b);\n    printf(\"Sum: %d\n\", a+b);\n    return 0;\n}}"}},
    {{"description": "Compile the C program", "command": "gcc -o add add.c"}},
    {{"description": "Run the program", "command": "./add"}}
]
Return ONLY the JSON array and no other text.
"#
    )
}

/// Pull the plan out of a free-form reply.
///
/// The first `[{ ... }]` that parses as JSON wins; prose before or after it
/// and code fences around it are ignored. A reply with no such array is
/// parsed whole (fences stripped), so a bare `[]` yields an empty plan.
pub fn extract_plan(raw: &str) -> Result<Plan, GenerationError> {
    // Reasoning models emit a <think> preamble; only what follows it counts.
    let reply = raw.rsplit("</think>").next().unwrap_or(raw);

    let values = match first_array(reply) {
        Some(values) => values,
        None => parse_whole(reply, raw)?,
    };

    let problems = validate_plan(&values);
    for problem in problems.iter().filter(|p| !p.is_fatal()) {
        warn!(%problem, "plan validation warning");
    }
    let fatal: Vec<String> = problems
        .iter()
        .filter(|p| p.is_fatal())
        .map(ToString::to_string)
        .collect();
    if !fatal.is_empty() {
        return Err(GenerationError::InvalidPlan {
            problems: fatal,
            raw: raw.to_string(),
        });
    }

    let steps: Vec<PlanStep> =
        serde_json::from_value(Value::Array(values)).map_err(|e| GenerationError::Malformed {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;
    Ok(Plan::new(steps))
}

fn first_array(text: &str) -> Option<Vec<Value>> {
    ARRAY_START.find_iter(text).find_map(|m| {
        // Parse one value from here on; anything after it is left alone.
        serde_json::Deserializer::from_str(&text[m.start()..])
            .into_iter::<Vec<Value>>()
            .next()
            .and_then(Result::ok)
    })
}

fn parse_whole(reply: &str, raw: &str) -> Result<Vec<Value>, GenerationError> {
    let cleaned = reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    match serde_json::from_str::<Value>(cleaned.trim()) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(other) => Err(GenerationError::Malformed {
            reason: format!("expected a JSON array, found {}", json_kind(&other)),
            raw: raw.to_string(),
        }),
        Err(_) => Err(GenerationError::NoPlanFound {
            raw: raw.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Planner backed by a text-generation service.
pub struct LlmPlanner<B> {
    backend: B,
    dialect: ShellDialect,
}

impl<B: LlmBackend> LlmPlanner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            dialect: ShellDialect::current(),
        }
    }

    pub fn with_dialect(mut self, dialect: ShellDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: LlmBackend> Planner for LlmPlanner<B> {
    fn generate(&self, task: &str, feedback: Option<&str>) -> Result<Plan, GenerationError> {
        let prompt = build_prompt(task, feedback, self.dialect);
        debug!(backend = self.backend.name(), has_feedback = feedback.is_some(), "requesting plan");

        let raw = self.backend.complete(&prompt)?;
        match extract_plan(&raw) {
            Ok(plan) => {
                debug!(steps = plan.len(), "plan extracted");
                Ok(plan)
            }
            Err(err) => {
                warn!(%err, raw = %raw, "failed to extract plan from reply");
                Err(err)
            }
        }
    }
}
