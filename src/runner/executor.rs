//! Plan execution
//!
//! Actions run one at a time in plan order. The first failure aborts the
//! rest of the plan. Servers started along the way are stopped when the
//! plan finishes, whether it succeeded or not.

use crate::config::{bump_package_file, load_run_control, DEFAULT_PORT, PACKAGE_FILE};
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{
    execute_tool_command, fsops, help, watch, Action, ClientTarget, Context, ExpandOptions, Plan,
    ServerScope, Step,
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Width of the separator around the env listing
const ENV_WIDTH: usize = 79;

/// Runs plans against a project
pub struct Executor<'a> {
    ctx: &'a Context,
    options: &'a ExpandOptions,
    servers: ServerScope,
}

impl<'a> Executor<'a> {
    /// Executor whose servers run the current executable
    pub fn new(ctx: &'a Context, options: &'a ExpandOptions) -> ExecutionResult<Self> {
        let servers = ServerScope::for_current_exe(&ctx.project_root)?;
        Ok(Executor::with_servers(ctx, options, servers))
    }

    pub fn with_servers(ctx: &'a Context, options: &'a ExpandOptions, servers: ServerScope) -> Self {
        Executor {
            ctx,
            options,
            servers,
        }
    }

    /// Run every action of a plan, stopping at the first failure
    pub fn run(&mut self, plan: &Plan) -> crate::Result<()> {
        let result = plan
            .actions()
            .iter()
            .try_for_each(|action| self.run_action(action));
        self.servers.stop();
        result
    }

    fn run_action(&mut self, action: &Action) -> crate::Result<()> {
        self.ctx.print_task_start(&action.name());

        match action {
            Action::Run(step) => self.run_step(step)?,
            Action::StartServer(profile) => {
                let port = self.server_port();
                self.servers.start(profile, &self.ctx.layout, port)?;
            }
            Action::Watch(requests) => {
                // Servers of earlier actions are not needed while watching
                self.servers.stop();
                watch::watch(self.ctx, self.options, requests)
                    .map_err(|e| ExecutionError::Watch(format!("{:#}", e)))?;
            }
        }
        Ok(())
    }

    fn server_port(&self) -> u16 {
        match load_run_control(&self.ctx.package.name, &self.ctx.project_root) {
            Ok(rc) => rc.port,
            Err(e) => {
                warn!("{}; assuming port {}", e, DEFAULT_PORT);
                DEFAULT_PORT
            }
        }
    }

    /// Run one primitive step
    pub fn run_step(&self, step: &Step) -> ExecutionResult<()> {
        let ctx = self.ctx;
        let layout = &ctx.layout;

        match step {
            Step::Clean(target) => {
                let removed = fsops::clean(*target, layout)?;
                info!(
                    "{} {} removed",
                    removed,
                    if removed == 1 { "path" } else { "paths" }
                );
            }
            Step::CopyCompile => {
                let package_file = ctx.project_root.join(PACKAGE_FILE);
                let copied = fsops::copy_compile(layout, &package_file)?;
                info!("Copied {} files", copied);
            }
            Step::ConcatCss => {
                let dest = fsops::concat_css(layout)?;
                info!("File {} created", ctx.display_path(&dest));
            }
            Step::MinifyCss => {
                let dest = fsops::minify_css(layout, &ctx.package)?;
                info!("File {} minified", ctx.display_path(&dest));
            }
            Step::Archive => {
                let dest = fsops::archive(layout, &ctx.package)?;
                info!("Created {}", ctx.display_path(&dest));
            }
            Step::Bump(part) => {
                let package_file = ctx.project_root.join(PACKAGE_FILE);
                let (old, new) = bump_package_file(&package_file, *part)?;
                info!("Version bumped from {} to {}", old, new);
            }
            Step::ShowEnv => println!("{}", render_env(ctx)),
            Step::ShowHelp => println!("{}", help::help_text(&ctx.package.name)),
            _ => self.run_tool(step)?,
        }
        Ok(())
    }

    fn run_tool(&self, step: &Step) -> ExecutionResult<()> {
        let tool = step
            .tool()
            .ok_or_else(|| ExecutionError::ToolNotConfigured(step.name()))?;
        let command = self
            .ctx
            .config
            .tool(tool)
            .ok_or_else(|| ExecutionError::ToolNotConfigured(tool.name().to_string()))?;

        let vars = tool_vars(step, self.ctx, self.servers.base_url());
        execute_tool_command(command, &vars, self.ctx)
    }
}

fn glob_list(patterns: &[String]) -> String {
    patterns.join(" ")
}

/// Variables a tool step receives on top of the context's
pub fn tool_vars(step: &Step, ctx: &Context, server_url: Option<String>) -> HashMap<String, String> {
    let layout = &ctx.layout;
    let path = |p: &std::path::Path| p.display().to_string();

    let app = layout.app();
    let test = layout.test();
    let app_js = layout.get("app/static/js");
    let app_css = layout.get("app/static/css");
    let app_lib = layout.get("app/static/lib");
    let build_static = layout.get("working/app/static");
    let build_js = layout.get("working/app/static/js");
    let build_css = layout.get("working/app/static/css");
    let source_excludes = glob_list(&[
        path(&app_js.child_path("require.js")),
        app_lib.glob_pattern(None),
    ]);
    let base_url = server_url.unwrap_or_else(|| format!("http://localhost:{}", DEFAULT_PORT));

    let mut vars = HashMap::new();
    let mut set = |key: &str, value: String| {
        vars.insert(key.to_string(), value);
    };

    match step {
        Step::Lint => {
            set("files", glob_list(&[app.glob_pattern(Some("js")), test.glob_pattern(Some("js"))]));
            set("excludes", source_excludes);
        }
        Step::Beautify => {
            set(
                "files",
                glob_list(&[
                    app.glob_pattern(Some("js")),
                    app_css.glob_pattern(Some("css")),
                    app_js.glob_pattern(Some("html")),
                    test.glob_pattern(Some("js")),
                ]),
            );
            set("excludes", source_excludes);
        }
        Step::FormatStyles => set("files", app_css.glob_pattern(Some("scss"))),
        Step::Templates => {
            set("src", path(build_js.path()));
            set("dest", path(build_js.path()));
            set("prefix", format!("/{}/", ctx.package.name));
        }
        Step::Bundle { optimize } => {
            set("main_config", path(&build_js.child_path("config.js")));
            set("base_url", path(build_static.path()));
            set("module", "js/app".to_string());
            set("out", path(&build_js.child_path("app.min.js")));
            set("optimize", if *optimize { "uglify" } else { "none" }.to_string());
        }
        Step::Styles => {
            set("css_dir", path(build_css.path()));
            set("sass_cache", path(layout.get(".sass-cache").path()));
        }
        Step::TestClient(target) => {
            let client = layout.get("test/client");
            let files = match target {
                ClientTarget::Dev => vec![
                    app_js.glob_pattern(Some("html")),
                    app_lib.glob_pattern(Some("js")),
                    app_js.glob_pattern(None),
                ],
                ClientTarget::Build => vec![
                    path(&build_js.child_path("app.min.js")),
                    path(&app_lib.child_path("angular-mocks/angular-mocks.js")),
                    build_js.glob_pattern(Some("js")),
                ],
            };
            set("target", target.name().to_string());
            set("loader", path(&client.child_path("test-loader.js")));
            set("files", glob_list(&files));
            set("tests", client.glob_pattern(Some("js")));
            set("mocks", layout.get("test/mocks").glob_pattern(None));
        }
        Step::TestServer => {
            let specs = layout.get("test/server").glob_pattern(Some("js"));
            set("specs", specs.clone());
            set("files", specs);
            set("base_url", base_url);
        }
        Step::TestE2e => {
            let e2e = layout.get("test/e2e");
            let specs = e2e.glob_pattern(Some("js"));
            set("specs", specs.clone());
            set("files", specs);
            set("excludes", path(&e2e.child_path("conf/*")));
            set("config", path(&e2e.child_path("conf/default.js")));
            set("base_url", base_url);
        }
        _ => {}
    }

    vars
}

/// Project tree with folder statuses, framed by separators
pub fn render_env(ctx: &Context) -> String {
    let separator = "-".repeat(ENV_WIDTH);
    format!(
        "\n{sep}\n  {} v{}\n  {}\n\n{}{sep}\n",
        ctx.package.name,
        ctx.package.version,
        ctx.project_root.display(),
        ctx.layout.tree().render_status(ENV_WIDTH - 5),
        sep = separator,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, PackageInfo};
    use crate::runner::{CleanTarget, Verbosity};
    use crate::tree::{default_tree, FolderTree, Layout};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn context(root: &Path, yaml: &str) -> Context {
        let layout = Layout::new(FolderTree::build(root, &default_tree()));
        let package = PackageInfo {
            name: "starter".to_string(),
            version: "1.0.0".to_string(),
        };
        Context::new(root.to_path_buf(), layout, package, parse_config(yaml).unwrap())
            .with_verbosity(Verbosity::Silent)
    }

    #[test]
    fn test_bundle_vars_follow_optimization() {
        let ctx = context(Path::new("/project"), "");
        let optimized = tool_vars(&Step::Bundle { optimize: true }, &ctx, None);
        assert_eq!(optimized["optimize"], "uglify");
        assert_eq!(optimized["out"], "/project/working/app/static/js/app.min.js");

        let passthrough = tool_vars(&Step::Bundle { optimize: false }, &ctx, None);
        assert_eq!(passthrough["optimize"], "none");
    }

    #[test]
    fn test_server_tests_receive_base_url() {
        let ctx = context(Path::new("/project"), "");
        let vars = tool_vars(&Step::TestE2e, &ctx, Some("http://localhost:4100".to_string()));
        assert_eq!(vars["base_url"], "http://localhost:4100");
        assert_eq!(vars["specs"], "/project/test/e2e/**/*.js");

        let vars = tool_vars(&Step::TestServer, &ctx, None);
        assert_eq!(vars["base_url"], "http://localhost:3000");
    }

    #[test]
    fn test_unconfigured_tool_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), "");
        let options = ExpandOptions::default();
        let executor = Executor::with_servers(&ctx, &options, ServerScope::new("true", dir.path()));

        let result = executor.run_step(&Step::Lint);
        assert!(matches!(result, Err(ExecutionError::ToolNotConfigured(name)) if name == "lint"));
    }

    #[test]
    fn test_failing_step_stops_plan() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        let ctx = context(dir.path(), "tools:\n  lint: \"false\"\n");
        let options = ExpandOptions::default();
        let mut executor =
            Executor::with_servers(&ctx, &options, ServerScope::new("true", dir.path()));

        let plan = Plan::from(vec![
            Action::Run(Step::Lint),
            Action::Run(Step::Clean(CleanTarget::Dist)),
        ]);
        assert!(executor.run(&plan).is_err());
        assert!(dir.path().join("dist").exists());
    }

    #[test]
    fn test_server_stopped_after_plan() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), "tools:\n  test-server: \"true\"\n");
        let options = ExpandOptions::default();
        let mut executor =
            Executor::with_servers(&ctx, &options, ServerScope::new("true", dir.path()));

        let plan = Plan::from(vec![
            Action::StartServer("dev".to_string()),
            Action::Run(Step::TestServer),
        ]);
        executor.run(&plan).unwrap();
        assert!(!executor.servers.is_running());
    }

    #[test]
    fn test_unknown_server_profile_fails_plan() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), "tools:\n  test-e2e: \"true\"\n");
        let options = ExpandOptions::default();
        let mut executor =
            Executor::with_servers(&ctx, &options, ServerScope::new("true", dir.path()));

        let plan = Plan::from(vec![
            Action::StartServer("staging".to_string()),
            Action::Run(Step::TestE2e),
        ]);
        let result = executor.run(&plan);
        assert!(matches!(
            result,
            Err(crate::RiggerError::Execution(ExecutionError::UnknownServerProfile(_)))
        ));
    }

    #[test]
    fn test_render_env_lists_statuses() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("app/static")).unwrap();
        let ctx = context(dir.path(), "");

        let output = render_env(&ctx);
        assert!(output.contains("starter v1.0.0"));
        assert!(output.contains("exists"));
        assert!(output.contains("missing"));
    }
}
