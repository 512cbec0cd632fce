//! Run-control files (`.<app>rc`)
//!
//! Values are read, in increasing precedence, from `~/.<app>rc`, from
//! `.<app>rc` files found walking from the root directory up to the project
//! directory, and from `<APP>_*` environment variables.

use crate::error::{ConfigError, ConfigResult};
use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ROOT_PATH: &str = "/";
pub const DEFAULT_LOGS_DIR: &str = "logs";
/// Roughly one year, in milliseconds
pub const DEFAULT_STATIC_FILE_CACHE_DURATION: u64 = 31_356_000_000;

/// Partial run-control values from one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunControl {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub root_path: Option<String>,
    #[serde(default)]
    pub proxy_present: Option<bool>,
    #[serde(default)]
    pub logs_dir: Option<String>,
    #[serde(default)]
    pub static_file_cache_duration: Option<u64>,
}

/// Run-control values with defaults filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunControlValues {
    pub port: u16,
    pub root_path: String,
    pub proxy_present: bool,
    pub logs_dir: String,
    pub static_file_cache_duration: u64,
}

impl Default for RunControlValues {
    fn default() -> Self {
        RunControl::default().resolve()
    }
}

impl RunControl {
    /// Parse a run-control file body (YAML or JSON)
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(RunControl::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Read a run-control file; missing files yield no values
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        if !path.is_file() {
            return Ok(RunControl::default());
        }
        let rc_error = |error: String| ConfigError::RunControl {
            path: path.to_path_buf(),
            error,
        };
        let contents = fs::read_to_string(path).map_err(|e| rc_error(e.to_string()))?;
        RunControl::parse(&contents).map_err(|e| rc_error(e.to_string()))
    }

    /// Read `<PREFIX>_<KEY>` variables through a lookup function
    pub fn from_env<F>(app_name: &str, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = env_prefix(app_name);
        let read = |key: &str| {
            let name = format!("{}_{}", prefix, key);
            lookup(&name).map(|value| (name, value))
        };

        Ok(RunControl {
            port: read("PORT").map(parse_env).transpose()?,
            root_path: read("ROOT_PATH").map(|(_, v)| v),
            proxy_present: read("PROXY_PRESENT").map(parse_env).transpose()?,
            logs_dir: read("LOGS_DIR").map(|(_, v)| v),
            static_file_cache_duration: read("STATIC_FILE_CACHE_DURATION")
                .map(parse_env)
                .transpose()?,
        })
    }

    /// Layer another source on top of this one
    pub fn merge(self, over: RunControl) -> RunControl {
        RunControl {
            port: over.port.or(self.port),
            root_path: over.root_path.or(self.root_path),
            proxy_present: over.proxy_present.or(self.proxy_present),
            logs_dir: over.logs_dir.or(self.logs_dir),
            static_file_cache_duration: over
                .static_file_cache_duration
                .or(self.static_file_cache_duration),
        }
    }

    /// Fill unset values with the defaults
    pub fn resolve(self) -> RunControlValues {
        RunControlValues {
            port: self.port.unwrap_or(DEFAULT_PORT),
            root_path: self
                .root_path
                .unwrap_or_else(|| DEFAULT_ROOT_PATH.to_string()),
            proxy_present: self.proxy_present.unwrap_or(false),
            logs_dir: self.logs_dir.unwrap_or_else(|| DEFAULT_LOGS_DIR.to_string()),
            static_file_cache_duration: self
                .static_file_cache_duration
                .unwrap_or(DEFAULT_STATIC_FILE_CACHE_DURATION),
        }
    }
}

/// Load run-control values for an application from all sources
pub fn load_run_control(app_name: &str, project_dir: &Path) -> ConfigResult<RunControlValues> {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    load_run_control_from(app_name, project_dir, home.as_deref(), |name| {
        std::env::var(name).ok()
    })
}

/// Load run-control values with an explicit home directory and environment
pub fn load_run_control_from<F>(
    app_name: &str,
    project_dir: &Path,
    home: Option<&Path>,
    lookup: F,
) -> ConfigResult<RunControlValues>
where
    F: Fn(&str) -> Option<String>,
{
    let file_name = format!(".{}rc", app_name);
    let mut rc = RunControl::default();

    let home_file = home.map(|h| h.join(&file_name));
    if let Some(path) = &home_file {
        rc = rc.merge(RunControl::from_file(path)?);
    }

    // Farthest ancestor first so the nearest file wins
    let mut candidates: Vec<PathBuf> = project_dir
        .ancestors()
        .map(|dir| dir.join(&file_name))
        .filter(|path| Some(path) != home_file.as_ref())
        .collect();
    candidates.reverse();
    for path in candidates {
        rc = rc.merge(RunControl::from_file(&path)?);
    }

    rc = rc.merge(RunControl::from_env(app_name, lookup)?);
    Ok(rc.resolve())
}

fn env_prefix(app_name: &str) -> String {
    app_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn parse_env<T: std::str::FromStr>((name, value): (String, String)) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvValue { name, value })
}
