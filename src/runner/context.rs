//! Execution context for task running
//!
//! The context carries what every step needs: the resolved project layout,
//! the package metadata, the tool configuration and the output verbosity.

use crate::config::{Config, PackageInfo};
use crate::tree::Layout;
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Execution context shared by all steps of a plan
pub struct Context {
    /// Directory holding rigger.yml
    pub project_root: PathBuf,

    /// Named folders of the project
    pub layout: Layout,

    /// Application name and version
    pub package: PackageInfo,

    /// Project configuration (tool commands, interpreter)
    pub config: Config,

    /// Variables available to every tool command
    pub vars: HashMap<String, String>,

    /// Interpreter for tool commands (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a context for a project
    pub fn new(project_root: PathBuf, layout: Layout, package: PackageInfo, config: Config) -> Self {
        let interpreter = config
            .interpreter
            .clone()
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| vec!["sh".to_string(), "-c".to_string()]);

        let mut ctx = Context {
            project_root,
            layout,
            package,
            config,
            vars: HashMap::new(),
            interpreter,
            verbosity: Verbosity::Normal,
        };
        ctx.vars = ctx.base_vars();
        ctx
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Get a variable value
    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Path relative to the project root, as shown in messages
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn base_vars(&self) -> HashMap<String, String> {
        let path = |p: &Path| p.display().to_string();
        let mut vars = HashMap::new();
        vars.insert("root".to_string(), path(&self.project_root));
        vars.insert("app".to_string(), path(self.layout.app().path()));
        vars.insert("test".to_string(), path(self.layout.test().path()));
        vars.insert("working".to_string(), path(self.layout.working().path()));
        vars.insert("build".to_string(), path(self.layout.build().path()));
        vars.insert("dist".to_string(), path(self.layout.dist().path()));
        vars.insert("logs".to_string(), path(self.layout.logs().path()));
        vars.insert("name".to_string(), self.package.name.clone());
        vars.insert("version".to_string(), self.package.version.clone());
        vars
    }

    /// Print the banner that opens a step
    pub fn print_task_start(&self, task_name: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("\n{}", format!("Running \"{}\" task", task_name).underline());
        }
    }

    /// Print the closing line of a successful plan
    pub fn print_done(&self) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("\n{}", "Done, without errors.".green());
        }
    }
}
