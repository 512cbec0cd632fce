//! Configuration validation
//!
//! This module provides validation logic for configuration files.

use crate::config::types::{Config, Tool};
use crate::error::{ConfigError, ConfigResult};
use crate::tree::{default_tree, missing_folders, FolderTree, Layout};
use std::path::Path;

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    // Validate each tool name
    for name in config.tools.keys() {
        if Tool::from_name(name).is_none() {
            return Err(ConfigError::UnknownTool(name.clone()));
        }
    }

    for (name, command) in &config.tools {
        if command.exec().trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Tool '{}' has an empty command",
                name
            )));
        }
    }

    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name at least one program".to_string(),
            ));
        }
    }

    // The tree must provide every folder the tasks reference
    if let Some(spec) = &config.tree {
        let tree = FolderTree::build(Path::new("."), spec);
        if let Some(first) = missing_folders(&tree).first() {
            return Err(ConfigError::MissingFolder(first.to_string()));
        }
    }

    Ok(())
}

/// Materialize the project layout for a validated configuration
pub fn build_layout(config: &Config, root: &Path) -> Layout {
    let tree = match &config.tree {
        Some(spec) => FolderTree::build(root, spec),
        None => FolderTree::build(root, &default_tree()),
    };
    Layout::new(tree)
}
