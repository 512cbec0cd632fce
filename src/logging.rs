//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The task runner logs to STDERR only, at a level chosen by the verbosity
//! flags or the `RIGGER_LOG` environment variable. The application server
//! installs two sinks, `app` and `access`, each writing to the console and
//! to a daily rotating file in the configured log directory.

use crate::config::{Environment, Settings};
use crate::runner::Verbosity;
use anyhow::{Context as _, Result};
use std::fs;
use tracing::Level;
use tracing_subscriber::filter::{filter_fn, LevelFilter};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{fmt, Layer};

/// Target of request log events
pub const ACCESS_TARGET: &str = "access";

/// Target of application log events
pub const APP_TARGET: &str = "app";

/// Initialise the console subscriber for the task runner.
///
/// Safe to call more than once; later calls keep the first subscriber.
pub fn init_console(verbosity: Verbosity) -> Result<()> {
    let level = std::env::var("RIGGER_LOG")
        .ok()
        .and_then(|s| parse_level_str(&s))
        .unwrap_or_else(|| level_for_verbosity(verbosity));

    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();

    Ok(())
}

/// Initialise the `app` and `access` sinks for the application server
pub fn init_sinks(settings: &Settings) -> Result<()> {
    fs::create_dir_all(&settings.logs_dir)
        .with_context(|| format!("creating log directory {}", settings.logs_dir.display()))?;

    let app_file = tracing_appender::rolling::daily(&settings.logs_dir, APP_TARGET);
    let access_file = tracing_appender::rolling::daily(&settings.logs_dir, ACCESS_TARGET);

    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(console_level(settings.environment));

    let app = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(app_file)
        .with_filter(filter_fn(|meta| {
            meta.target() != ACCESS_TARGET && *meta.level() <= Level::INFO
        }));

    let access = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(access_file)
        .with_filter(filter_fn(|meta| {
            meta.target() == ACCESS_TARGET && *meta.level() <= Level::INFO
        }));

    tracing_subscriber::registry()
        .with(console)
        .with(app)
        .with(access)
        .try_init()
        .context("installing log subscriber")?;

    Ok(())
}

/// Console threshold for an environment; unknown environments log at info
pub fn console_level(environment: Option<Environment>) -> LevelFilter {
    match environment {
        Some(Environment::Development) => LevelFilter::TRACE,
        Some(Environment::Test) => LevelFilter::DEBUG,
        Some(Environment::Production) | None => LevelFilter::INFO,
    }
}

fn level_for_verbosity(verbosity: Verbosity) -> LevelFilter {
    match verbosity {
        Verbosity::Silent => LevelFilter::OFF,
        Verbosity::Quiet => LevelFilter::WARN,
        Verbosity::Normal => LevelFilter::INFO,
        Verbosity::Verbose => LevelFilter::DEBUG,
    }
}

fn parse_level_str(s: &str) -> Option<LevelFilter> {
    match s.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}
