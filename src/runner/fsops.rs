//! Native file steps: clean, copy, stylesheet concatenation and
//! minification, and the distribution archive.

use crate::config::PackageInfo;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::CleanTarget;
use crate::tree::{FolderNode, Layout};
use chrono::{DateTime, Local};
use glob::Pattern;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the concatenated and minified stylesheet
pub const CSS_BUNDLE: &str = "app.min.css";

/// Scripts kept in the staged js folder after a build
pub const KEPT_SCRIPTS: [&str; 3] = ["app.min.js", "config.js", "require.js"];

/// One entry of an ordered clean list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanPattern {
    /// Add every path matching the glob
    Include(String),
    /// Drop matching paths collected so far and protect them from removal
    Exclude(String),
}

impl CleanPattern {
    /// Parse a `!`-prefixed exclude or a plain include
    pub fn parse(entry: &str) -> CleanPattern {
        match entry.strip_prefix('!') {
            Some(rest) => CleanPattern::Exclude(rest.to_string()),
            None => CleanPattern::Include(entry.to_string()),
        }
    }
}

fn literal(path: &Path) -> String {
    Pattern::escape(&path.to_string_lossy())
}

fn below(node: &FolderNode, pattern: &str) -> String {
    format!("{}/{}", literal(node.path()), pattern)
}

/// Ordered include and exclude list for a clean target
pub fn clean_patterns(target: CleanTarget, layout: &Layout) -> Vec<CleanPattern> {
    use CleanPattern::{Exclude, Include};

    let js = layout.get("working/app/static/js");
    let css = layout.get("working/app/static/css");
    let lib = layout.get("working/app/static/lib");

    match target {
        CleanTarget::Dist => vec![Include(literal(layout.dist().path()))],
        CleanTarget::Working => vec![Include(literal(layout.working().path()))],
        CleanTarget::SassCache => vec![Include(literal(layout.get(".sass-cache").path()))],
        CleanTarget::Coverage => vec![Include(literal(layout.get("coverage").path()))],
        CleanTarget::Logs => vec![Include(below(layout.logs(), "*"))],
        CleanTarget::WorkingJs => {
            let mut patterns = vec![Include(below(js, "**/*"))];
            patterns.extend(
                KEPT_SCRIPTS
                    .iter()
                    .map(|name| Exclude(below(js, &format!("**/{}", name)))),
            );
            patterns
        }
        CleanTarget::WorkingStyles => vec![
            Include(below(css, "**/*.scss")),
            Include(below(css, "**/*.css")),
            Exclude(below(css, CSS_BUNDLE)),
        ],
        CleanTarget::WorkingLib => vec![
            Include(below(lib, "*")),
            Exclude(below(lib, "requirejs")),
            Exclude(below(lib, "bootstrap")),
            Include(below(lib, "bootstrap/*")),
            Exclude(below(lib, "bootstrap/dist")),
        ],
    }
}

/// Paths selected by an ordered clean list
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanSelection {
    /// Paths to remove
    pub remove: BTreeSet<PathBuf>,
    /// Paths dropped by an exclude; their ancestors are never removed
    pub protected: BTreeSet<PathBuf>,
}

/// Evaluate include and exclude patterns in order
pub fn select_paths(patterns: &[CleanPattern]) -> ExecutionResult<CleanSelection> {
    let mut selection = CleanSelection::default();

    for entry in patterns {
        match entry {
            CleanPattern::Include(pattern) => {
                let paths = glob::glob(pattern).map_err(|e| ExecutionError::InvalidOption {
                    name: "clean".to_string(),
                    error: e.to_string(),
                })?;
                // Unreadable entries are skipped
                for path in paths.flatten() {
                    selection.remove.insert(path);
                }
            }
            CleanPattern::Exclude(pattern) => {
                let matcher = Pattern::new(pattern).map_err(|e| ExecutionError::InvalidOption {
                    name: "clean".to_string(),
                    error: e.to_string(),
                })?;
                let dropped: Vec<PathBuf> = selection
                    .remove
                    .iter()
                    .filter(|path| matcher.matches_path(path))
                    .cloned()
                    .collect();
                for path in dropped {
                    selection.remove.remove(&path);
                    selection.protected.insert(path);
                }
            }
        }
    }

    Ok(selection)
}

fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove the selected paths. Running it twice is harmless.
///
/// Returns the number of paths removed.
pub fn remove_selection(selection: &CleanSelection) -> ExecutionResult<usize> {
    let mut removed: Vec<&Path> = Vec::new();

    for path in &selection.remove {
        if removed.iter().any(|done| path.starts_with(done)) {
            continue;
        }
        if selection.protected.iter().any(|kept| kept.starts_with(path)) {
            debug!("keeping {} (contains excluded paths)", path.display());
            continue;
        }
        remove_path(path).map_err(|e| ExecutionError::file(path, e))?;
        debug!("removed {}", path.display());
        removed.push(path);
    }

    Ok(removed.len())
}

/// Run one clean target
pub fn clean(target: CleanTarget, layout: &Layout) -> ExecutionResult<usize> {
    let selection = select_paths(&clean_patterns(target, layout))?;
    remove_selection(&selection)
}

/// Recursively copy a directory; returns the number of files copied
pub fn copy_tree(src: &Path, dest: &Path) -> ExecutionResult<usize> {
    fs::create_dir_all(dest).map_err(|e| ExecutionError::file(dest, e))?;

    let mut copied = 0;
    let entries = fs::read_dir(src).map_err(|e| ExecutionError::file(src, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ExecutionError::file(src, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| ExecutionError::file(&from, e))?;

        if file_type.is_dir() {
            copied += copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| ExecutionError::file(&from, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Stage the application sources and package file into the working folder
pub fn copy_compile(layout: &Layout, package_file: &Path) -> ExecutionResult<usize> {
    let mut copied = copy_tree(layout.app().path(), layout.build().path())?;

    let dest = layout.working().child_path(
        package_file
            .file_name()
            .unwrap_or_else(|| package_file.as_os_str()),
    );
    fs::copy(package_file, &dest).map_err(|e| ExecutionError::file(package_file, e))?;
    copied += 1;

    Ok(copied)
}

/// Concatenate the staged stylesheets into the css bundle
pub fn concat_css(layout: &Layout) -> ExecutionResult<PathBuf> {
    let css = layout.get("working/app/static/css");
    let dest = css.child_path(CSS_BUNDLE);

    let paths = glob::glob(&css.glob_pattern(Some("css"))).map_err(|e| {
        ExecutionError::InvalidOption {
            name: "concat".to_string(),
            error: e.to_string(),
        }
    })?;

    let mut parts = Vec::new();
    for path in paths.flatten() {
        if path == dest || !path.is_file() {
            continue;
        }
        let contents = fs::read_to_string(&path).map_err(|e| ExecutionError::file(&path, e))?;
        parts.push(contents);
    }

    fs::write(&dest, parts.join("\n")).map_err(|e| ExecutionError::file(&dest, e))?;
    Ok(dest)
}

/// Banner prepended to minified output
pub fn banner(package: &PackageInfo, now: DateTime<Local>) -> String {
    format!(
        "/*! [{} v{}] Built: {} */\n",
        package.name,
        package.version,
        now.format("%Y-%m-%d %I:%M %P")
    )
}

/// Strip comments and insignificant whitespace from a stylesheet
pub fn minify_stylesheet(source: &str) -> ExecutionResult<String> {
    let invalid = |e: regex::Error| ExecutionError::InvalidOption {
        name: "minify".to_string(),
        error: e.to_string(),
    };
    let comments = Regex::new(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/").map_err(invalid)?;
    let whitespace = Regex::new(r"\s+").map_err(invalid)?;
    let punctuation = Regex::new(r"\s*([{};,>])\s*").map_err(invalid)?;
    let colon = Regex::new(r":\s+").map_err(invalid)?;

    let css = comments.replace_all(source, "");
    let css = whitespace.replace_all(&css, " ");
    let css = punctuation.replace_all(&css, "$1");
    let css = colon.replace_all(&css, ":");
    Ok(css.replace(";}", "}").trim().to_string())
}

/// Minify the css bundle in place
pub fn minify_css(layout: &Layout, package: &PackageInfo) -> ExecutionResult<PathBuf> {
    let path = layout.get("working/app/static/css").child_path(CSS_BUNDLE);
    let source = fs::read_to_string(&path).map_err(|e| ExecutionError::file(&path, e))?;

    let minified = minify_stylesheet(&source)?;
    let output = format!("{}{}", banner(package, Local::now()), minified);
    fs::write(&path, output).map_err(|e| ExecutionError::file(&path, e))?;
    Ok(path)
}

/// Zip the working folder into `dist/<name>_<version>.zip`
pub fn archive(layout: &Layout, package: &PackageInfo) -> ExecutionResult<PathBuf> {
    let source = layout.working().path();
    let dest = layout.dist().child_path(package.archive_name());
    fs::create_dir_all(layout.dist().path())
        .map_err(|e| ExecutionError::file(layout.dist().path(), e))?;

    let file = File::create(&dest).map_err(|e| ExecutionError::file(&dest, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let paths = glob::glob(&layout.working().glob_pattern(None)).map_err(|e| {
        ExecutionError::InvalidOption {
            name: "archive".to_string(),
            error: e.to_string(),
        }
    })?;

    for path in paths.flatten() {
        let Ok(relative) = path.strip_prefix(source) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");

        if path.is_dir() {
            zip.add_directory(name, options)
                .map_err(|e| ExecutionError::file(&path, e))?;
        } else {
            zip.start_file(name, options)
                .map_err(|e| ExecutionError::file(&path, e))?;
            let mut input = File::open(&path).map_err(|e| ExecutionError::file(&path, e))?;
            io::copy(&mut input, &mut zip).map_err(|e| ExecutionError::file(&path, e))?;
        }
    }

    zip.finish().map_err(|e| ExecutionError::file(&dest, e))?;
    Ok(dest)
}
