//! Package metadata (package.json)

use crate::error::{ConfigError, ConfigResult, ExecutionError, ExecutionResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File holding the application name and version
pub const PACKAGE_FILE: &str = "package.json";

const UNKNOWN: &str = "__UNKNOWN__";

/// Name and version of the application
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

impl PackageInfo {
    /// Load metadata from a package file. Any failure is fatal for the caller.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let metadata_error = |error: String| ConfigError::PackageMetadata {
            path: path.to_path_buf(),
            error,
        };

        let contents = fs::read_to_string(path).map_err(|e| metadata_error(e.to_string()))?;
        let info: PackageInfo =
            serde_json::from_str(&contents).map_err(|e| metadata_error(e.to_string()))?;

        if info.name.trim().is_empty() {
            return Err(metadata_error("package name is empty".to_string()));
        }
        Ok(info)
    }

    /// Placeholder used by informational tasks when no package file exists
    pub fn unknown() -> Self {
        PackageInfo {
            name: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
        }
    }

    /// Placeholder carrying a configured name, if there is one
    pub fn placeholder(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => PackageInfo {
                name: name.to_string(),
                ..PackageInfo::unknown()
            },
            None => PackageInfo::unknown(),
        }
    }

    /// File name of the distributable archive
    pub fn archive_name(&self) -> String {
        format!("{}_{}.zip", self.name, self.version)
    }
}

/// Version component incremented by the bump task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpPart {
    Major,
    Minor,
    Patch,
}

impl BumpPart {
    /// Parse the bump sub-target; no sub-target means patch
    pub fn from_target(target: Option<&str>) -> Option<BumpPart> {
        match target {
            None | Some("patch") => Some(BumpPart::Patch),
            Some("minor") => Some(BumpPart::Minor),
            Some("major") => Some(BumpPart::Major),
            Some(_) => None,
        }
    }
}

/// Increment a `major.minor.patch` version. Pre-release and build suffixes are dropped.
pub fn bump_version(version: &str, part: BumpPart) -> ExecutionResult<String> {
    let core = version
        .trim()
        .split(|c| c == '-' || c == '+')
        .next()
        .unwrap_or_default();

    let numbers = core
        .split('.')
        .map(|n| n.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ExecutionError::InvalidVersion(version.to_string()))?;

    let (major, minor, patch) = match numbers.as_slice() {
        [major, minor, patch] => (*major, *minor, *patch),
        _ => return Err(ExecutionError::InvalidVersion(version.to_string())),
    };

    let next = |n: u64| {
        n.checked_add(1)
            .ok_or_else(|| ExecutionError::InvalidVersion(version.to_string()))
    };
    let bumped = match part {
        BumpPart::Major => (next(major)?, 0, 0),
        BumpPart::Minor => (major, next(minor)?, 0),
        BumpPart::Patch => (major, minor, next(patch)?),
    };
    Ok(format!("{}.{}.{}", bumped.0, bumped.1, bumped.2))
}

/// Rewrite the version field of a package file, keeping every other field in place.
///
/// Returns the previous and the new version.
pub fn bump_package_file(path: &Path, part: BumpPart) -> ExecutionResult<(String, String)> {
    let contents = fs::read_to_string(path).map_err(|e| ExecutionError::file(path, e))?;
    let mut document: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| ExecutionError::file(path, e))?;

    let current = document
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ExecutionError::InvalidVersion("<missing>".to_string()))?
        .to_string();
    let next = bump_version(&current, part)?;

    if let Some(object) = document.as_object_mut() {
        object.insert("version".to_string(), serde_json::Value::String(next.clone()));
    }

    let mut output =
        serde_json::to_string_pretty(&document).map_err(|e| ExecutionError::file(path, e))?;
    output.push('\n');
    fs::write(path, output).map_err(|e| ExecutionError::file(path, e))?;

    Ok((current, next))
}
