//! Primitive steps and execution plans

use crate::config::{BumpPart, Tool};
use crate::runner::TaskRequest;
use std::fmt;

/// Folders and artifact sets removed by the clean steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanTarget {
    Dist,
    Working,
    SassCache,
    Coverage,
    Logs,
    /// Staged scripts other than the final bundle and loader
    WorkingJs,
    /// Staged stylesheets other than the final bundle
    WorkingStyles,
    /// Staged libraries not used at runtime
    WorkingLib,
}

impl CleanTarget {
    pub fn name(self) -> &'static str {
        match self {
            CleanTarget::Dist => "dist",
            CleanTarget::Working => "working",
            CleanTarget::SassCache => "sassCache",
            CleanTarget::Coverage => "coverage",
            CleanTarget::Logs => "logs",
            CleanTarget::WorkingJs => "workingJs",
            CleanTarget::WorkingStyles => "workingStyles",
            CleanTarget::WorkingLib => "workingLib",
        }
    }
}

/// Target files for client side tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientTarget {
    /// Source files
    Dev,
    /// Build artifacts in the working folder
    Build,
}

impl ClientTarget {
    pub fn name(self) -> &'static str {
        match self {
            ClientTarget::Dev => "dev",
            ClientTarget::Build => "build",
        }
    }
}

/// An atomic build or test action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Clean(CleanTarget),
    /// Copy the application sources and package file into the working folder
    CopyCompile,
    Beautify,
    FormatStyles,
    Lint,
    Templates,
    /// Bundle modules; without optimization the bundle is a plain concatenation
    Bundle { optimize: bool },
    Styles,
    ConcatCss,
    MinifyCss,
    TestClient(ClientTarget),
    TestServer,
    TestE2e,
    Archive,
    Bump(BumpPart),
    ShowEnv,
    ShowHelp,
}

impl Step {
    /// Name shown in task banners
    pub fn name(&self) -> String {
        match self {
            Step::Clean(target) => format!("clean:{}", target.name()),
            Step::CopyCompile => "copy:compile".to_string(),
            Step::Bundle { optimize: true } => "bundle".to_string(),
            Step::Bundle { optimize: false } => "bundle:passthrough".to_string(),
            Step::ConcatCss => "concat:css".to_string(),
            Step::MinifyCss => "minify:css".to_string(),
            Step::TestClient(target) => format!("test-client:{}", target.name()),
            Step::Archive => "archive".to_string(),
            Step::Bump(BumpPart::Major) => "bump:major".to_string(),
            Step::Bump(BumpPart::Minor) => "bump:minor".to_string(),
            Step::Bump(BumpPart::Patch) => "bump:patch".to_string(),
            Step::ShowEnv => "env".to_string(),
            Step::ShowHelp => "help".to_string(),
            other => other
                .tool()
                .map(|tool| tool.name().to_string())
                .unwrap_or_default(),
        }
    }

    /// External tool backing this step, if any
    pub fn tool(&self) -> Option<Tool> {
        match self {
            Step::Beautify => Some(Tool::Beautify),
            Step::FormatStyles => Some(Tool::FormatStyles),
            Step::Lint => Some(Tool::Lint),
            Step::Templates => Some(Tool::Templates),
            Step::Bundle { .. } => Some(Tool::Bundle),
            Step::Styles => Some(Tool::Styles),
            Step::TestClient(_) => Some(Tool::TestClient),
            Step::TestServer => Some(Tool::TestServer),
            Step::TestE2e => Some(Tool::TestE2e),
            _ => None,
        }
    }
}

/// One entry of an execution plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Step),
    /// Launch the application server under a profile and keep going
    StartServer(String),
    /// Watch sources and run these tasks on every change
    Watch(Vec<TaskRequest>),
}

impl Action {
    pub fn name(&self) -> String {
        match self {
            Action::Run(step) => step.name(),
            Action::StartServer(profile) => format!("server:{}", profile),
            Action::Watch(_) => "watch".to_string(),
        }
    }
}

impl From<Step> for Action {
    fn from(step: Step) -> Self {
        Action::Run(step)
    }
}

/// Ordered list of actions produced by task expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl Into<Action>) {
        self.actions.push(action.into());
    }

    pub fn extend(&mut self, other: Plan) {
        self.actions.extend(other.actions);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Action names in order
    pub fn names(&self) -> Vec<String> {
        self.actions.iter().map(Action::name).collect()
    }

    /// Whether any action runs the given step
    pub fn contains_step(&self, step: &Step) -> bool {
        self.actions
            .iter()
            .any(|action| matches!(action, Action::Run(s) if s == step))
    }
}

impl From<Vec<Action>> for Plan {
    fn from(actions: Vec<Action>) -> Self {
        Plan { actions }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names() {
        assert_eq!(Step::Clean(CleanTarget::WorkingJs).name(), "clean:workingJs");
        assert_eq!(Step::Bundle { optimize: false }.name(), "bundle:passthrough");
        assert_eq!(Step::TestClient(ClientTarget::Build).name(), "test-client:build");
        assert_eq!(Step::TestE2e.name(), "test-e2e");
        assert_eq!(Step::Lint.name(), "lint");
    }

    #[test]
    fn test_step_tools() {
        assert_eq!(Step::Bundle { optimize: true }.tool(), Some(Tool::Bundle));
        assert_eq!(Step::ConcatCss.tool(), None);
    }

    #[test]
    fn test_plan_display() {
        let mut plan = Plan::new();
        plan.push(Action::StartServer("dev".to_string()));
        plan.push(Step::TestServer);
        assert_eq!(plan.to_string(), "[server:dev, test-server]");
        assert!(plan.contains_step(&Step::TestServer));
        assert!(!plan.contains_step(&Step::TestE2e));
    }
}
