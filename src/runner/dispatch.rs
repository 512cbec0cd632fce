//! Dispatch rules for the `test` and `monitor` task families
//!
//! The `test` grammar is a fixed table: each test type lists the targets it
//! accepts and whether a server must be running first. Requests outside the
//! table resolve to an empty action list with a warning; they never fail.

use crate::runner::{Action, ClientTarget, Step, TaskName, TaskRequest};
use std::ops::ControlFlow;
use tracing::warn;

/// Default target for test requests
pub const DEFAULT_TARGET: &str = "dev";

/// Families of tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Client,
    Server,
    E2e,
}

/// Targets a test type accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRule {
    OneOf(&'static [&'static str]),
    /// Any target is accepted; the server profile check happens at run time
    Any,
}

impl TargetRule {
    pub fn permits(self, target: &str) -> bool {
        match self {
            TargetRule::OneOf(targets) => targets.contains(&target),
            TargetRule::Any => true,
        }
    }
}

/// One row of the test grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRule {
    pub kind: TestKind,
    pub name: &'static str,
    pub targets: TargetRule,
    pub requires_server: bool,
}

pub const TEST_GRAMMAR: [TestRule; 3] = [
    TestRule {
        kind: TestKind::Client,
        name: "client",
        targets: TargetRule::OneOf(&["dev", "build"]),
        requires_server: false,
    },
    TestRule {
        kind: TestKind::Server,
        name: "server",
        targets: TargetRule::Any,
        requires_server: true,
    },
    TestRule {
        kind: TestKind::E2e,
        name: "e2e",
        targets: TargetRule::Any,
        requires_server: true,
    },
];

/// Find the grammar row for a test type
pub fn test_rule(test_type: &str) -> Option<&'static TestRule> {
    TEST_GRAMMAR.iter().find(|rule| rule.name == test_type)
}

/// Resolve a test request into its actions.
///
/// Invalid combinations log a warning and resolve to nothing.
pub fn dispatch_test(test_type: Option<&str>, target: Option<&str>) -> Vec<Action> {
    let target = target.unwrap_or(DEFAULT_TARGET);

    let Some(rule) = test_type.and_then(test_rule) else {
        warn!(
            "Unrecognized test type [{}]. Please see help (rigger help) for task usage information",
            test_type.unwrap_or_default()
        );
        return Vec::new();
    };

    if !rule.targets.permits(target) {
        warn!(
            "The target [{}] is not applicable for {} testing",
            target, rule.name
        );
        return Vec::new();
    }

    let step = match rule.kind {
        TestKind::Client => {
            let client_target = if target == "build" {
                ClientTarget::Build
            } else {
                ClientTarget::Dev
            };
            Step::TestClient(client_target)
        }
        TestKind::Server => Step::TestServer,
        TestKind::E2e => Step::TestE2e,
    };

    let mut actions = Vec::new();
    if rule.requires_server {
        actions.push(Action::StartServer(target.to_string()));
    }
    actions.push(Action::Run(step));
    actions
}

/// Modes accepted by the monitor task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorToken {
    Lint,
    Client,
    Server,
    E2e,
    Build,
}

impl MonitorToken {
    pub fn parse(token: &str) -> Option<MonitorToken> {
        match token {
            "lint" => Some(MonitorToken::Lint),
            "client" => Some(MonitorToken::Client),
            "server" => Some(MonitorToken::Server),
            "e2e" => Some(MonitorToken::E2e),
            "build" => Some(MonitorToken::Build),
            _ => None,
        }
    }
}

fn test_request(test_type: &str, target: &str) -> TaskRequest {
    TaskRequest::with_args(TaskName::Test, [test_type, target])
}

/// Full lint, build and test cycle against build artifacts
pub fn full_build_cycle() -> Vec<TaskRequest> {
    vec![
        TaskRequest::new(TaskName::Lint),
        TaskRequest::new(TaskName::Build),
        test_request("client", "build"),
        test_request("server", "build"),
        test_request("e2e", "build"),
    ]
}

/// Reduce monitor tokens into the tasks to run on change.
///
/// `build` anywhere replaces everything with [`full_build_cycle`] and stops
/// the reduction. Unknown tokens are ignored with a warning.
pub fn monitor_requests<S: AsRef<str>>(tokens: &[S], server_mode: &str) -> Vec<TaskRequest> {
    let reduced = tokens.iter().try_fold(Vec::new(), |mut acc, token| {
        let token = token.as_ref();
        match MonitorToken::parse(token) {
            Some(MonitorToken::Build) => return ControlFlow::Break(full_build_cycle()),
            Some(MonitorToken::Lint) => acc.push(TaskRequest::new(TaskName::Lint)),
            Some(MonitorToken::Client) => acc.push(test_request("client", "dev")),
            Some(MonitorToken::Server) => acc.push(test_request("server", server_mode)),
            Some(MonitorToken::E2e) => acc.push(test_request("e2e", server_mode)),
            None => warn!("Unrecognized argument: {}", token),
        }
        ControlFlow::Continue(acc)
    });

    match reduced {
        ControlFlow::Continue(requests) | ControlFlow::Break(requests) => requests,
    }
}
