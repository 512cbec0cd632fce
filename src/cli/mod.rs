//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, dispatch to the task runner or
//! the example server, and shell completion.

pub mod app;

// Re-export main types
pub use app::*;
