//! Tool command execution
//!
//! Tool steps run the command configured for them in rigger.yml through the
//! context's interpreter, after `${var}` interpolation.

use crate::config::ToolCommand;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{interpolate, Context, Verbosity};
use std::collections::HashMap;
use std::process::{Command as StdCommand, Stdio};
use tracing::debug;

/// Execute a tool command with step variables layered over the context's
pub fn execute_tool_command(
    cmd: &ToolCommand,
    step_vars: &HashMap<String, String>,
    ctx: &Context,
) -> ExecutionResult<()> {
    let mut vars = ctx.vars.clone();
    vars.extend(step_vars.iter().map(|(k, v)| (k.clone(), v.clone())));

    let exec_str = interpolate(cmd.exec(), &vars).map_err(|e| ExecutionError::InvalidOption {
        name: "command".to_string(),
        error: e.to_string(),
    })?;

    if !cmd.is_quiet() && ctx.verbosity >= Verbosity::Normal {
        let print_str = interpolate(cmd.print(), &vars).unwrap_or_else(|_| cmd.print().to_string());
        eprintln!("[RUN] {}", print_str);
    }

    let working_dir = match cmd.dir() {
        Some(dir) => {
            let dir = interpolate(dir, &vars).map_err(|e| ExecutionError::InvalidOption {
                name: "dir".to_string(),
                error: e.to_string(),
            })?;
            ctx.project_root.join(dir)
        }
        None => ctx.project_root.clone(),
    };

    let (program, args) = ctx
        .interpreter
        .split_first()
        .ok_or_else(|| ExecutionError::InvalidOption {
            name: "interpreter".to_string(),
            error: "no program given".to_string(),
        })?;

    debug!("{} {:?} {:?} (in {})", program, args, exec_str, working_dir.display());

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .arg(&exec_str)
        .current_dir(&working_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    // Variables are exported so tools can read them without interpolation
    for (key, value) in &vars {
        command.env(format!("RIGGER_{}", key.to_uppercase()), value);
    }

    let status = command.status().map_err(|e| ExecutionError::Spawn {
        program: program.clone(),
        error: e.to_string(),
    })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed(status.code()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PackageInfo, ToolCommandDetail};
    use crate::tree::{default_tree, FolderTree, Layout};
    use tempfile::TempDir;

    fn context(root: &std::path::Path) -> Context {
        let layout = Layout::new(FolderTree::build(root, &default_tree()));
        Context::new(root.to_path_buf(), layout, PackageInfo::unknown(), Config::default())
            .with_verbosity(Verbosity::Silent)
    }

    #[test]
    fn test_execute_simple_command() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let cmd = ToolCommand::Simple("true".to_string());

        assert!(execute_tool_command(&cmd, &HashMap::new(), &ctx).is_ok());
    }

    #[test]
    fn test_step_variables_are_interpolated() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let mut vars = HashMap::new();
        vars.insert("out".to_string(), "${working}/out.txt".to_string());

        let cmd = ToolCommand::Simple("mkdir -p ${working} && echo ${name} > ${out}".to_string());
        execute_tool_command(&cmd, &vars, &ctx).unwrap();

        let written = std::fs::read_to_string(dir.path().join("working/out.txt")).unwrap();
        assert_eq!(written.trim(), "__UNKNOWN__");
    }

    #[test]
    fn test_command_runs_in_configured_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        let ctx = context(dir.path());
        let cmd = ToolCommand::Complex(ToolCommandDetail {
            exec: "touch marker".to_string(),
            print: None,
            quiet: true,
            dir: Some("app".to_string()),
        });

        execute_tool_command(&cmd, &HashMap::new(), &ctx).unwrap();
        assert!(dir.path().join("app/marker").exists());
    }

    #[test]
    fn test_execute_failing_command() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let cmd = ToolCommand::Simple("exit 3".to_string());

        let result = execute_tool_command(&cmd, &HashMap::new(), &ctx);
        assert!(matches!(result, Err(ExecutionError::CommandFailed(Some(3)))));
    }

    #[test]
    fn test_missing_interpreter_reports_os_error() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            interpreter: Some(vec!["rigger-no-such-shell".to_string(), "-c".to_string()]),
            ..Config::default()
        };
        let layout = Layout::new(FolderTree::build(dir.path(), &default_tree()));
        let ctx = Context::new(dir.path().to_path_buf(), layout, PackageInfo::unknown(), config)
            .with_verbosity(Verbosity::Silent);

        let err = execute_tool_command(&ToolCommand::Simple("true".to_string()), &HashMap::new(), &ctx)
            .unwrap_err();
        match &err {
            ExecutionError::Spawn { program, error } => {
                assert_eq!(program, "rigger-no-such-shell");
                assert!(!error.is_empty());
            }
            other => panic!("expected a spawn error, got {:?}", other),
        }
        assert!(err.to_string().contains("rigger-no-such-shell"));
    }
}
