//! Task invocation requests
//!
//! Tasks are named on the command line as colon-separated tokens, e.g.
//! `build:debugMode` or `test:client:build`. The first segment names the
//! task; the remaining segments are its positional arguments.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Tasks exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskName {
    Default,
    Package,
    Help,
    Env,
    Clean,
    Lint,
    Build,
    Test,
    Monitor,
    Bump,
}

impl TaskName {
    pub const ALL: [TaskName; 10] = [
        TaskName::Default,
        TaskName::Package,
        TaskName::Help,
        TaskName::Env,
        TaskName::Clean,
        TaskName::Lint,
        TaskName::Build,
        TaskName::Test,
        TaskName::Monitor,
        TaskName::Bump,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskName::Default => "default",
            TaskName::Package => "package",
            TaskName::Help => "help",
            TaskName::Env => "env",
            TaskName::Clean => "clean",
            TaskName::Lint => "lint",
            TaskName::Build => "build",
            TaskName::Test => "test",
            TaskName::Monitor => "monitor",
            TaskName::Bump => "bump",
        }
    }

    pub fn from_name(name: &str) -> Option<TaskName> {
        TaskName::ALL.iter().copied().find(|task| task.name() == name)
    }

    /// One-line description for listings
    pub fn about(self) -> &'static str {
        match self {
            TaskName::Default => "Beautify, lint, build and test build artifacts, then clean up",
            TaskName::Package => "Build, test and archive a distribution of the app",
            TaskName::Help => "Show task documentation",
            TaskName::Env => "Show the project layout and the status of each folder",
            TaskName::Clean => "Remove build artifacts and temporary files",
            TaskName::Lint => "Lint all source files",
            TaskName::Build => "Build all sources into the working folder",
            TaskName::Test => "Run client, server or end to end tests",
            TaskName::Monitor => "Watch sources and run tasks on change",
            TaskName::Bump => "Increment the package version",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A task plus its positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub task: TaskName,
    pub args: Vec<String>,
}

impl TaskRequest {
    pub fn new(task: TaskName) -> Self {
        TaskRequest {
            task,
            args: Vec::new(),
        }
    }

    /// Create a request with positional arguments
    pub fn with_args<I, S>(task: TaskName, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TaskRequest {
            task,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Positional argument by index
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl FromStr for TaskRequest {
    type Err = ConfigError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut parts = token.split(':');
        let name = parts.next().unwrap_or_default();
        let task =
            TaskName::from_name(name).ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))?;
        let args = parts.filter(|p| !p.is_empty()).map(str::to_string).collect();
        Ok(TaskRequest { task, args })
    }
}

impl fmt::Display for TaskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task.name())?;
        for arg in &self.args {
            write!(f, ":{}", arg)?;
        }
        Ok(())
    }
}
