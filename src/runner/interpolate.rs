//! Variable interpolation for strings
//!
//! This module handles parsing and replacing variables in strings using the ${var} syntax.

use crate::error::{InterpolationError, InterpolationResult};
use regex::Regex;
use std::collections::HashMap;
use std::env;

/// Passes after which a still-changing string is treated as recursive
const MAX_PASSES: usize = 32;

fn variable_pattern() -> InterpolationResult<Regex> {
    Regex::new(r"\$\{([^}]+)\}").map_err(|e| InterpolationError::InvalidSyntax(e.to_string()))
}

/// Interpolate variables in a string
///
/// Supports:
/// - `${var}` - variable from context
/// - Environment variables (when not found in context)
///
/// Unknown variables are left untouched.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let re = variable_pattern()?;
    let mut result = s.to_string();

    // Values may themselves contain ${var} references
    for _ in 0..MAX_PASSES {
        let mut changed = false;

        let next = re
            .replace_all(&result, |caps: &regex::Captures| {
                let var_name = &caps[1];

                // Try to get from provided variables first
                if let Some(value) = vars.get(var_name) {
                    changed = true;
                    return value.clone();
                }

                // Try environment variables
                if let Ok(value) = env::var(var_name) {
                    changed = true;
                    return value;
                }

                caps[0].to_string()
            })
            .to_string();

        if !changed {
            return Ok(next);
        }
        result = next;
    }

    Err(InterpolationError::RecursiveInterpolation)
}

/// Interpolate with strict mode - errors on undefined variables
pub fn interpolate_strict(
    s: &str,
    vars: &HashMap<String, String>,
) -> InterpolationResult<String> {
    let result = interpolate(s, vars)?;

    // Check if there are any remaining ${} patterns
    let re = variable_pattern()?;
    if let Some(caps) = re.captures(&result) {
        return Err(InterpolationError::UndefinedVariable(caps[1].to_string()));
    }

    Ok(result)
}
