//! Core configuration types
//!
//! This module defines the data structures that represent a rigger.yml configuration file.

use crate::tree::TreeSpec;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Application name used when package.json is missing
    #[serde(default)]
    pub name: Option<String>,

    /// Project layout; the built-in layout is used when absent
    #[serde(default)]
    pub tree: Option<TreeSpec>,

    /// Interpreter used for tool commands (e.g., ["sh", "-c"])
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,

    /// External commands backing the tool steps, keyed by tool name
    #[serde(default)]
    pub tools: BTreeMap<String, ToolCommand>,
}

/// A tool command
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolCommand {
    /// Simple string command
    Simple(String),

    /// Complex command with additional options
    Complex(ToolCommandDetail),
}

/// Detailed command definition
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ToolCommandDetail {
    /// The command to execute
    pub exec: String,

    /// What to print when running (defaults to exec)
    #[serde(default)]
    pub print: Option<String>,

    /// Whether to suppress the command echo
    #[serde(default)]
    pub quiet: bool,

    /// Working directory for the command, relative to the project root
    #[serde(default)]
    pub dir: Option<String>,
}

/// Steps delegated to external commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Beautify javascript, html and css sources
    Beautify,
    /// Pretty-print stylesheet sources
    FormatStyles,
    /// Lint sources
    Lint,
    /// Compile UI templates into code
    Templates,
    /// Bundle the module graph
    Bundle,
    /// Compile stylesheet sources to css
    Styles,
    /// Client side unit tests
    TestClient,
    /// Server side tests
    TestServer,
    /// End to end tests
    TestE2e,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::Beautify,
        Tool::FormatStyles,
        Tool::Lint,
        Tool::Templates,
        Tool::Bundle,
        Tool::Styles,
        Tool::TestClient,
        Tool::TestServer,
        Tool::TestE2e,
    ];

    /// Key of this tool in the tools section
    pub fn name(self) -> &'static str {
        match self {
            Tool::Beautify => "beautify",
            Tool::FormatStyles => "format-styles",
            Tool::Lint => "lint",
            Tool::Templates => "templates",
            Tool::Bundle => "bundle",
            Tool::Styles => "styles",
            Tool::TestClient => "test-client",
            Tool::TestServer => "test-server",
            Tool::TestE2e => "test-e2e",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.iter().copied().find(|tool| tool.name() == name)
    }
}

impl Config {
    /// Command configured for a tool
    pub fn tool(&self, tool: Tool) -> Option<&ToolCommand> {
        self.tools.get(tool.name())
    }
}

impl ToolCommand {
    /// Get the command to execute
    pub fn exec(&self) -> &str {
        match self {
            ToolCommand::Simple(cmd) => cmd,
            ToolCommand::Complex(detail) => &detail.exec,
        }
    }

    /// Get what to print
    pub fn print(&self) -> &str {
        match self {
            ToolCommand::Simple(cmd) => cmd,
            ToolCommand::Complex(detail) => detail.print.as_deref().unwrap_or(&detail.exec),
        }
    }

    /// Check if this command is quiet
    pub fn is_quiet(&self) -> bool {
        match self {
            ToolCommand::Simple(_) => false,
            ToolCommand::Complex(detail) => detail.quiet,
        }
    }

    /// Get the working directory
    pub fn dir(&self) -> Option<&str> {
        match self {
            ToolCommand::Simple(_) => None,
            ToolCommand::Complex(detail) => detail.dir.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_simple_config() {
        let yaml = r#"
tools:
  lint: npx jshint ${files}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tools.len(), 1);
        assert_eq!(config.tools["lint"].exec(), "npx jshint ${files}");
        assert!(config.tree.is_none());
    }

    #[test]
    fn test_deserialize_complex_tool() {
        let yaml = r#"
tools:
  bundle:
    exec: npx r.js -o optimize=${optimize}
    print: bundling modules
    quiet: true
    dir: working
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let bundle = &config.tools["bundle"];
        assert_eq!(bundle.print(), "bundling modules");
        assert!(bundle.is_quiet());
        assert_eq!(bundle.dir(), Some("working"));
    }

    #[test]
    fn test_deserialize_tree_override() {
        let yaml = r#"
name: starter
tree:
  app:
    static: ~
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, Some("starter".to_string()));
        assert_eq!(config.tree.unwrap().entries().count(), 1);
    }
}
