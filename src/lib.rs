// src/lib.rs

//! Turns a natural-language task into shell commands, runs them under human
//! supervision and re-plans from operator feedback until the task is done.

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod setup;
pub mod tools;
pub mod validation;
