//! Main CLI application

use crate::config::{
    build_layout, find_config_file, load_dotenv, parse_config_file, project_root,
    resolve_for_app, validate_config, Config, PackageInfo, PACKAGE_FILE,
};
use crate::error::{ConfigError, RiggerError};
use crate::runner::{expand, Context, ExpandOptions, Executor, TaskName, TaskRequest, Verbosity};
use crate::{logging, server, VERSION};
use anyhow::{Context as _, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the server environment
pub const ENV_VAR: &str = "RIGGER_ENV";

/// Environment used by `serve` when none is given
pub const DEFAULT_ENVIRONMENT: &str = "development";

fn task_listing() -> String {
    let lines: Vec<String> = TaskName::ALL
        .iter()
        .map(|task| format!("  {:<10}{}", task.name(), task.about()))
        .collect();
    format!(
        "Tasks:\n{}\n\nTasks take colon-separated sub targets, e.g. build:debugMode or test:client:build.\nRun `rigger help` for details.",
        lines.join("\n")
    )
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new("rigger")
        .version(VERSION)
        .about("Build, test and package single-page web applications")
        .after_help(task_listing())
        .args_conflicts_with_subcommands(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("tasks")
                .value_name("TASK")
                .num_args(1..)
                .help("Tasks to run, in order (default: default)"),
        )
        .arg(
            Arg::new("debugMode")
                .long("debugMode")
                .value_name("BOOL")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(value_parser!(bool))
                .help("Build without optimization; overrides the build sub target"),
        )
        .arg(
            Arg::new("serverMode")
                .long("serverMode")
                .value_name("MODE")
                .default_value("dev")
                .help("Server profile used by monitor for server and e2e tests"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to rigger.yml config file")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output, warnings and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the example application server")
                .arg(
                    Arg::new("app-dir")
                        .long("app-dir")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("app")
                        .help("Application folder to serve"),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Project holding package.json and run-control files (default: parent of the app folder)"),
                )
                .arg(
                    Arg::new("env")
                        .long("env")
                        .value_name("NAME")
                        .env(ENV_VAR)
                        .default_value(DEFAULT_ENVIRONMENT)
                        .help("Environment whose overrides apply"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(value_parser!(Shell)),
                ),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Parse task tokens; no tokens means the default task
pub fn parse_requests(tokens: &[String]) -> Result<Vec<TaskRequest>, ConfigError> {
    if tokens.is_empty() {
        return Ok(vec![TaskRequest::new(TaskName::Default)]);
    }
    tokens.iter().map(|token| token.parse()).collect()
}

fn expand_options(matches: &ArgMatches) -> ExpandOptions {
    ExpandOptions {
        debug_mode: matches.get_one::<bool>("debugMode").copied(),
        server_mode: matches
            .get_one::<String>("serverMode")
            .cloned()
            .unwrap_or_else(|| "dev".to_string()),
    }
}

/// Load rigger.yml from `-f` or by searching upwards; without one the
/// built-in layout applies to the working directory
fn load_config(file: Option<&PathBuf>) -> Result<(Config, PathBuf), RiggerError> {
    if let Some(path) = file {
        let config = parse_config_file(path)?;
        return Ok((config, project_root(path)));
    }

    match find_config_file() {
        Ok(path) => {
            let config = parse_config_file(&path)?;
            Ok((config, project_root(&path)))
        }
        Err(ConfigError::NotFound(_)) => {
            let cwd = std::env::current_dir()?;
            info!("No rigger.yml found; using the default layout in {}", cwd.display());
            Ok((Config::default(), cwd))
        }
        Err(e) => Err(e.into()),
    }
}

fn load_package(root: &Path, configured_name: Option<&str>) -> PackageInfo {
    match PackageInfo::load(&root.join(PACKAGE_FILE)) {
        Ok(package) => package,
        Err(e) => {
            warn!("{}; using placeholder name and version", e);
            PackageInfo::placeholder(configured_name)
        }
    }
}

fn run_tasks(matches: &ArgMatches, verbosity: Verbosity) -> Result<()> {
    logging::init_console(verbosity)?;

    let tokens: Vec<String> = matches
        .get_many::<String>("tasks")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let requests = parse_requests(&tokens)?;
    let options = expand_options(matches);

    let (config, root) = load_config(matches.get_one::<PathBuf>("file"))?;
    validate_config(&config)?;
    load_dotenv(&root);

    let layout = build_layout(&config, &root);
    let package = load_package(&root, config.name.as_deref());
    let ctx = Context::new(root, layout, package, config).with_verbosity(verbosity);

    let plan = expand(&requests, &options)?;
    debug!("execution plan: {}", plan);

    let mut executor = Executor::new(&ctx, &options)?;
    executor.run(&plan)?;
    ctx.print_done();
    Ok(())
}

fn absolute(path: PathBuf) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Application and project folders of a `serve` invocation
fn serve_dirs(matches: &ArgMatches) -> io::Result<(PathBuf, PathBuf)> {
    let app_dir = absolute(
        matches
            .get_one::<PathBuf>("app-dir")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("app")),
    )?;
    let project_dir = match matches.get_one::<PathBuf>("project-dir") {
        Some(dir) => absolute(dir.clone())?,
        None => app_dir.parent().unwrap_or(&app_dir).to_path_buf(),
    };
    Ok((app_dir, project_dir))
}

fn run_server(matches: &ArgMatches) -> Result<()> {
    let (app_dir, project_dir) = serve_dirs(matches)?;
    let env_name = matches
        .get_one::<String>("env")
        .map(String::as_str)
        .unwrap_or(DEFAULT_ENVIRONMENT);

    let settings = resolve_for_app(&app_dir, &project_dir, env_name)?;
    logging::init_sinks(&settings)?;
    server::run(settings)
}

fn print_completions(matches: &ArgMatches) -> Result<()> {
    let shell = *matches
        .get_one::<Shell>("shell")
        .context("no shell given")?;
    let mut command = build_command();
    clap_complete::generate(shell, &mut command, "rigger", &mut io::stdout());
    Ok(())
}

/// Run the CLI application with the given arguments
pub fn run_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);
    let verbosity = get_verbosity(&matches);

    match matches.subcommand() {
        Some(("serve", sub)) => run_server(sub),
        Some(("completions", sub)) => print_completions(sub),
        _ => run_tasks(&matches, verbosity),
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<()> {
    run_from(std::env::args_os())
}
