//! Rigger - a build and test task orchestrator
//!
//! Rigger drives the build pipeline of a single-page web application
//! template: composite tasks expand into ordered steps that clean, stage,
//! compile, bundle, minify, test and package the application. It also ships
//! the example application server the tests run against.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod server;
pub mod tree;

// Re-export commonly used types
pub use error::{Result, RiggerError};

/// Current version of Rigger
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
