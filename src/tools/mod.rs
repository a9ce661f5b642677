// src/tools/mod.rs

//! Leaf helpers used by the step executor and planner.

pub mod classifier;
pub mod llm;
pub mod run_command;
pub mod write_file;

pub use classifier::is_interactive;
pub use llm::LlmBackend;
pub use write_file::write_file;
