//! Error types for Rigger

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Rigger operations
pub type Result<T> = std::result::Result<T, RiggerError>;

/// Main error type for Rigger
#[derive(Error, Debug)]
pub enum RiggerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unable to read package metadata from '{path}': {error}")]
    PackageMetadata { path: PathBuf, error: String },

    #[error("Failed to read run-control file '{path}': {error}")]
    RunControl { path: PathBuf, error: String },

    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnvValue { name: String, value: String },

    #[error("Folder '{0}' is required by the build but missing from the tree")]
    MissingFolder(String),

    #[error("Unknown tool '{0}' in tools section")]
    UnknownTool(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Circular task expansion detected: {0}")]
    CircularDependency(String),
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    #[error("Tool '{0}' has no command configured in the tools section")]
    ToolNotConfigured(String),

    #[error("Unknown server profile '{0}' (expected dev or build)")]
    UnknownServerProfile(String),

    #[error("Failed to start server: {0}")]
    ServerStart(String),

    #[error("Invalid option value for '{name}': {error}")]
    InvalidOption { name: String, error: String },

    #[error("Invalid version '{0}' in package metadata")]
    InvalidVersion(String),

    #[error("File operation failed on '{path}': {error}")]
    FileOperation { path: PathBuf, error: String },

    #[error("Watch error: {0}")]
    Watch(String),
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Invalid interpolation syntax: {0}")]
    InvalidSyntax(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

impl ExecutionError {
    /// Wrap an I/O error with the path it happened on
    pub fn file(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        ExecutionError::FileOperation {
            path: path.into(),
            error: error.to_string(),
        }
    }
}
