//! Expansion of composite tasks into execution plans

use crate::config::BumpPart;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::dispatch::{dispatch_test, monitor_requests, DEFAULT_TARGET};
use crate::runner::{Action, CleanTarget, Plan, Step, TaskName, TaskRequest};
use tracing::{info, warn};

/// Sub-target that selects a debug build
pub const DEBUG_TARGET: &str = "debugMode";

/// Options that influence expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Value of `--debugMode` when given on the command line
    pub debug_mode: Option<bool>,
    /// Server profile used by monitor for server and e2e tests
    pub server_mode: String,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            debug_mode: None,
            server_mode: DEFAULT_TARGET.to_string(),
        }
    }
}

/// Decide debug mode: the command-line option wins over the sub-target
pub fn is_debug_build(option: Option<bool>, target: Option<&str>) -> bool {
    option.unwrap_or(target == Some(DEBUG_TARGET))
}

/// Ordered primitive steps of a build
pub fn build_steps(debug_mode: bool) -> Vec<Step> {
    let mut steps = vec![
        Step::Clean(CleanTarget::Dist),
        Step::Clean(CleanTarget::Working),
        Step::CopyCompile,
        Step::Templates,
        Step::Bundle {
            optimize: !debug_mode,
        },
        Step::Styles,
        Step::ConcatCss,
    ];
    if !debug_mode {
        steps.push(Step::MinifyCss);
    }
    // Intermediate removal always comes last
    steps.extend([
        Step::Clean(CleanTarget::WorkingJs),
        Step::Clean(CleanTarget::WorkingStyles),
        Step::Clean(CleanTarget::SassCache),
        Step::Clean(CleanTarget::Coverage),
        Step::Clean(CleanTarget::WorkingLib),
    ]);
    steps
}

/// Steps run by the clean task
pub fn clean_steps() -> Vec<Step> {
    [
        CleanTarget::Dist,
        CleanTarget::Working,
        CleanTarget::SassCache,
        CleanTarget::Coverage,
        CleanTarget::Logs,
        CleanTarget::WorkingJs,
        CleanTarget::WorkingStyles,
        CleanTarget::WorkingLib,
    ]
    .into_iter()
    .map(Step::Clean)
    .collect()
}

/// Pre-checkin sequence shared by `default` and `package`
fn checkin_requests() -> Vec<TaskRequest> {
    let test = |kind: &str| TaskRequest::with_args(TaskName::Test, [kind, "build"]);
    vec![
        TaskRequest::new(TaskName::Build),
        test("client"),
        test("server"),
        test("e2e"),
    ]
}

/// Expands task requests, guarding against composite tasks re-entering themselves
#[derive(Debug)]
pub struct TaskGraph<'a> {
    options: &'a ExpandOptions,
    stack: Vec<TaskName>,
}

impl<'a> TaskGraph<'a> {
    pub fn new(options: &'a ExpandOptions) -> Self {
        TaskGraph {
            options,
            stack: Vec::new(),
        }
    }

    /// Expand a sequence of requests into one plan
    pub fn expand_all(&mut self, requests: &[TaskRequest]) -> ConfigResult<Plan> {
        let mut plan = Plan::new();
        for request in requests {
            plan.extend(self.expand(request)?);
        }
        Ok(plan)
    }

    /// Expand one request
    pub fn expand(&mut self, request: &TaskRequest) -> ConfigResult<Plan> {
        if self.stack.contains(&request.task) {
            let mut cycle: Vec<&str> = self.stack.iter().map(|t| t.name()).collect();
            cycle.push(request.task.name());
            return Err(ConfigError::CircularDependency(cycle.join(" -> ")));
        }

        self.stack.push(request.task);
        let result = self.expand_task(request);
        self.stack.pop();
        result
    }

    fn expand_task(&mut self, request: &TaskRequest) -> ConfigResult<Plan> {
        let mut plan = Plan::new();

        match request.task {
            TaskName::Default | TaskName::Package => {
                plan.push(Step::Beautify);
                plan.push(Step::FormatStyles);
                plan.extend(self.expand(&TaskRequest::new(TaskName::Lint))?);
                plan.extend(self.expand_all(&checkin_requests())?);
                if request.task == TaskName::Package {
                    plan.push(Step::Archive);
                } else {
                    plan.extend(self.expand(&TaskRequest::new(TaskName::Clean))?);
                }
            }
            TaskName::Help => plan.push(Step::ShowHelp),
            TaskName::Env => plan.push(Step::ShowEnv),
            TaskName::Clean => {
                for step in clean_steps() {
                    plan.push(step);
                }
            }
            TaskName::Lint => plan.push(Step::Lint),
            TaskName::Build => {
                let debug_mode = is_debug_build(self.options.debug_mode, request.arg(0));
                if debug_mode {
                    info!("Executing build in debug mode");
                }
                for step in build_steps(debug_mode) {
                    plan.push(step);
                }
            }
            TaskName::Test => {
                for action in dispatch_test(request.arg(0), request.arg(1)) {
                    plan.push(action);
                }
            }
            TaskName::Monitor => {
                let requests = monitor_requests(&request.args, &self.options.server_mode);
                if requests.is_empty() {
                    info!("No tasks specified to execute on change");
                } else {
                    let listed: Vec<String> = requests.iter().map(ToString::to_string).collect();
                    info!("Tasks to run on change: [{}]", listed.join(","));
                    plan.push(Action::Watch(requests));
                }
            }
            TaskName::Bump => match BumpPart::from_target(request.arg(0)) {
                Some(part) => plan.push(Step::Bump(part)),
                None => warn!(
                    "Unrecognized version component [{}]; expected major or minor",
                    request.arg(0).unwrap_or_default()
                ),
            },
        }

        Ok(plan)
    }
}

/// Expand requests with the given options
pub fn expand(requests: &[TaskRequest], options: &ExpandOptions) -> ConfigResult<Plan> {
    TaskGraph::new(options).expand_all(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_for(token: &str, debug_mode: Option<bool>) -> Plan {
        let options = ExpandOptions {
            debug_mode,
            ..ExpandOptions::default()
        };
        let request: TaskRequest = token.parse().unwrap();
        expand(&[request], &options).unwrap()
    }

    #[test]
    fn test_build_order() {
        let plan = plan_for("build", None);
        assert_eq!(
            plan.names(),
            vec![
                "clean:dist",
                "clean:working",
                "copy:compile",
                "templates",
                "bundle",
                "styles",
                "concat:css",
                "minify:css",
                "clean:workingJs",
                "clean:workingStyles",
                "clean:sassCache",
                "clean:coverage",
                "clean:workingLib",
            ]
        );
    }

    #[test]
    fn test_debug_build_skips_optimization() {
        let plan = plan_for("build:debugMode", None);
        assert!(!plan.contains_step(&Step::MinifyCss));
        assert!(plan.contains_step(&Step::Bundle { optimize: false }));
        assert!(!plan.contains_step(&Step::Bundle { optimize: true }));
        assert_eq!(plan.names().last().unwrap(), "clean:workingLib");
    }

    #[test]
    fn test_debug_option_wins_over_target() {
        let plan = plan_for("build:debugMode", Some(false));
        assert!(plan.contains_step(&Step::MinifyCss));

        let plan = plan_for("build", Some(true));
        assert!(!plan.contains_step(&Step::MinifyCss));
    }

    #[test]
    fn test_is_debug_build() {
        assert!(is_debug_build(None, Some("debugMode")));
        assert!(!is_debug_build(None, Some("release")));
        assert!(!is_debug_build(None, None));
        assert!(is_debug_build(Some(true), None));
    }

    #[test]
    fn test_default_sequence() {
        let names = plan_for("default", None).names();
        assert_eq!(&names[..3], &["beautify", "format-styles", "lint"]);
        assert!(names.contains(&"test-client:build".to_string()));

        let server = names.iter().position(|n| n == "server:build").unwrap();
        let server_tests = names.iter().position(|n| n == "test-server").unwrap();
        assert!(server < server_tests);
        assert_eq!(names.last().unwrap(), "clean:workingLib");
    }

    #[test]
    fn test_package_ends_with_archive() {
        let names = plan_for("package", None).names();
        assert_eq!(names.last().unwrap(), "archive");
        assert!(!names.contains(&"clean:logs".to_string()));
    }

    #[test]
    fn test_invalid_test_request_is_empty() {
        assert!(plan_for("test:client:e2e", None).is_empty());
    }

    #[test]
    fn test_monitor_plan() {
        let plan = plan_for("monitor:lint:client", None);
        assert_eq!(plan.len(), 1);
        match &plan.actions()[0] {
            Action::Watch(requests) => assert_eq!(requests.len(), 2),
            other => panic!("unexpected action {:?}", other),
        }

        assert!(plan_for("monitor", None).is_empty());
    }

    #[test]
    fn test_bump_targets() {
        assert!(plan_for("bump", None).contains_step(&Step::Bump(BumpPart::Patch)));
        assert!(plan_for("bump:major", None).contains_step(&Step::Bump(BumpPart::Major)));
        assert!(plan_for("bump:huge", None).is_empty());
    }

    #[test]
    fn test_self_reentry_is_rejected() {
        let options = ExpandOptions::default();
        let mut graph = TaskGraph::new(&options);
        graph.stack.push(TaskName::Clean);
        let result = graph.expand(&TaskRequest::new(TaskName::Clean));
        assert!(matches!(result, Err(ConfigError::CircularDependency(_))));
    }
}
