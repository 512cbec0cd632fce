//! Runtime settings for the application server
//!
//! Settings are computed once per process by layering built-in defaults,
//! run-control values and the overrides of the selected environment. The
//! result is an immutable [`Settings`] value handed to every consumer.

use crate::config::package::{PackageInfo, PACKAGE_FILE};
use crate::config::rc::{load_run_control, RunControlValues};
use crate::error::ConfigResult;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environments with registered overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Map an environment name; `dev` and `prod` are accepted as aliases
    pub fn from_name(name: &str) -> Option<Environment> {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "test" => Some(Environment::Test),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    /// Overrides this environment applies to the base settings
    pub fn overrides(self, base_version: &str, now: DateTime<Utc>) -> SettingsOverrides {
        let busted_version = || format!("{}__{}", base_version, now.timestamp_millis());
        match self {
            Environment::Development => SettingsOverrides {
                app_version: Some(busted_version()),
                static_file_cache_duration: Some(0),
                enable_request_logger: Some(true),
                enable_dynamic_css_compile: Some(true),
                enable_minified_files: Some(false),
                ..SettingsOverrides::default()
            },
            Environment::Test => SettingsOverrides {
                app_version: Some(busted_version()),
                static_file_cache_duration: Some(0),
                ..SettingsOverrides::default()
            },
            Environment::Production => SettingsOverrides::default(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field overrides produced by an environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub app_version: Option<String>,
    pub root_path: Option<String>,
    pub static_file_cache_duration: Option<u64>,
    pub enable_request_logger: Option<bool>,
    pub enable_dynamic_css_compile: Option<bool>,
    pub enable_minified_files: Option<bool>,
}

/// A scalar setting value, used when listing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Str(String),
    Number(u64),
    Bool(bool),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Str(s) => f.write_str(s),
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Resolved application settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Environment name as requested
    pub env_name: String,
    /// Environment with registered overrides, if the name is known
    pub environment: Option<Environment>,
    pub app_name: String,
    pub app_version: String,
    pub port: u16,
    pub root_path: String,
    pub proxy_present: bool,
    /// URL prefix the routes are served under
    pub mount_path: String,
    pub app_dir: PathBuf,
    pub static_dir: PathBuf,
    pub views_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Cache duration for static files, in milliseconds
    pub static_file_cache_duration: u64,
    pub enable_request_logger: bool,
    pub enable_dynamic_css_compile: bool,
    pub enable_minified_files: bool,
}

impl Settings {
    /// Base settings before environment overrides
    pub fn base(package: PackageInfo, rc: RunControlValues, app_dir: &Path) -> Settings {
        let project_dir = app_dir.parent().unwrap_or(app_dir);
        let logs_dir = PathBuf::from(&rc.logs_dir);
        let logs_dir = if logs_dir.is_absolute() {
            logs_dir
        } else {
            project_dir.join(logs_dir)
        };

        Settings {
            env_name: String::new(),
            environment: None,
            app_name: package.name,
            app_version: package.version,
            port: rc.port,
            mount_path: rc.root_path.clone(),
            root_path: rc.root_path,
            proxy_present: rc.proxy_present,
            app_dir: app_dir.to_path_buf(),
            static_dir: app_dir.join("static"),
            views_dir: app_dir.join("views"),
            logs_dir,
            static_file_cache_duration: rc.static_file_cache_duration,
            enable_request_logger: false,
            enable_dynamic_css_compile: false,
            enable_minified_files: true,
        }
    }

    /// Merge overrides and recompute the mount path
    pub fn apply(mut self, overrides: SettingsOverrides) -> Settings {
        if let Some(version) = overrides.app_version {
            self.app_version = version;
        }
        if let Some(root_path) = overrides.root_path {
            self.root_path = root_path;
        }
        if let Some(duration) = overrides.static_file_cache_duration {
            self.static_file_cache_duration = duration;
        }
        if let Some(enabled) = overrides.enable_request_logger {
            self.enable_request_logger = enabled;
        }
        if let Some(enabled) = overrides.enable_dynamic_css_compile {
            self.enable_dynamic_css_compile = enabled;
        }
        if let Some(enabled) = overrides.enable_minified_files {
            self.enable_minified_files = enabled;
        }
        self.mount_path = mount_path(self.proxy_present, &self.root_path);
        self
    }

    /// Settings as ordered key/value pairs
    pub fn entries(&self) -> Vec<(&'static str, SettingValue)> {
        let text = |s: &str| SettingValue::Str(s.to_string());
        let path = |p: &Path| SettingValue::Str(p.display().to_string());
        vec![
            ("port", SettingValue::Number(u64::from(self.port))),
            ("cfg_env", text(&self.env_name)),
            ("cfg_app_name", text(&self.app_name)),
            ("cfg_app_version", text(&self.app_version)),
            ("cfg_static_dir", path(&self.static_dir)),
            ("cfg_views_dir", path(&self.views_dir)),
            ("cfg_logs_dir", path(&self.logs_dir)),
            ("cfg_proxy_present", SettingValue::Bool(self.proxy_present)),
            ("cfg_root_path", text(&self.root_path)),
            ("cfg_mount_path", text(&self.mount_path)),
            (
                "cfg_static_file_cache_duration",
                SettingValue::Number(self.static_file_cache_duration),
            ),
            ("cfg_enable_request_logger", SettingValue::Bool(self.enable_request_logger)),
            (
                "cfg_enable_dynamic_css_compile",
                SettingValue::Bool(self.enable_dynamic_css_compile),
            ),
            ("cfg_enable_minified_files", SettingValue::Bool(self.enable_minified_files)),
        ]
    }
}

/// Mount path: `/` behind a proxy, otherwise the configured root path
pub fn mount_path(proxy_present: bool, root_path: &str) -> String {
    if proxy_present {
        "/".to_string()
    } else {
        root_path.to_string()
    }
}

/// Resolve settings from already loaded inputs
pub fn resolve(
    package: PackageInfo,
    rc: RunControlValues,
    app_dir: &Path,
    environment_name: &str,
    now: DateTime<Utc>,
) -> Settings {
    let mut base = Settings::base(package, rc, app_dir);
    base.env_name = environment_name.to_string();

    let environment = Environment::from_name(environment_name);
    base.environment = environment;

    let overrides = match environment {
        Some(env) => {
            debug!(target: "app", environment = env.name(), "applying config overrides");
            env.overrides(&base.app_version, now)
        }
        None => {
            info!(
                target: "app",
                "no config overrides found for environment [{}]", environment_name
            );
            SettingsOverrides::default()
        }
    };

    base.apply(overrides)
}

/// Load a project's `.env` file into the process environment.
///
/// Values already set in the environment are kept. A missing file is not an error.
pub fn load_dotenv(project_dir: &Path) {
    let path = project_dir.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => debug!(target: "app", "loaded {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!(target: "app", "ignoring unreadable .env file: {}", e),
    }
}

/// Resolve settings for an application directory inside a project.
///
/// Package metadata, run-control files and `.env` are read from the project
/// directory; failure to read the metadata is fatal.
pub fn resolve_for_app(
    app_dir: &Path,
    project_dir: &Path,
    environment_name: &str,
) -> ConfigResult<Settings> {
    load_dotenv(project_dir);

    let package = PackageInfo::load(&project_dir.join(PACKAGE_FILE))?;
    let mut rc = load_run_control(&package.name, project_dir)?;

    // Relative log folders belong to the project, not to the served folder
    let logs_dir = Path::new(&rc.logs_dir);
    if logs_dir.is_relative() {
        rc.logs_dir = project_dir.join(logs_dir).display().to_string();
    }

    Ok(resolve(package, rc, app_dir, environment_name, Utc::now()))
}
