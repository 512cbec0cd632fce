//! Application servers started for server and end to end tests
//!
//! A server is a child process running `rigger serve`. Starting a server is
//! fire-and-continue; the scope that started it stops it when dropped.

use crate::error::{ExecutionError, ExecutionResult};
use crate::tree::Layout;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Profiles a server can be started under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerProfile {
    /// Application sources, development settings
    Dev,
    /// Staged build artifacts, test settings
    Build,
}

impl ServerProfile {
    pub fn from_name(name: &str) -> Option<ServerProfile> {
        match name {
            "dev" => Some(ServerProfile::Dev),
            "build" => Some(ServerProfile::Build),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ServerProfile::Dev => "dev",
            ServerProfile::Build => "build",
        }
    }

    /// Environment the server resolves its settings for
    pub fn environment(self) -> &'static str {
        match self {
            ServerProfile::Dev => "development",
            ServerProfile::Build => "test",
        }
    }

    /// Application folder the server runs against
    pub fn app_dir(self, layout: &Layout) -> &Path {
        match self {
            ServerProfile::Dev => layout.app().path(),
            ServerProfile::Build => layout.build().path(),
        }
    }
}

/// A running server process
#[derive(Debug)]
pub struct ServerHandle {
    profile: ServerProfile,
    port: u16,
    child: Child,
}

impl ServerHandle {
    pub fn profile(&self) -> ServerProfile {
        self.profile
    }

    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    fn stop(mut self) {
        debug!("stopping {} server (pid {})", self.profile.name(), self.child.id());
        // The process may already have exited
        let _ = self.child.kill();
        if let Err(e) = self.child.wait() {
            warn!("Failed to reap {} server: {}", self.profile.name(), e);
        }
    }
}

/// Owns the servers started while running a plan
#[derive(Debug)]
pub struct ServerScope {
    program: PathBuf,
    working_dir: PathBuf,
    current: Option<ServerHandle>,
}

impl ServerScope {
    /// Scope that launches servers with the given program
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        ServerScope {
            program: program.into(),
            working_dir: working_dir.into(),
            current: None,
        }
    }

    /// Scope that launches servers with the running executable
    pub fn for_current_exe(working_dir: impl Into<PathBuf>) -> ExecutionResult<Self> {
        let program =
            std::env::current_exe().map_err(|e| ExecutionError::ServerStart(e.to_string()))?;
        Ok(ServerScope::new(program, working_dir))
    }

    /// Start a server for a profile, replacing any server already running
    pub fn start(&mut self, profile_name: &str, layout: &Layout, port: u16) -> ExecutionResult<()> {
        let profile = ServerProfile::from_name(profile_name)
            .ok_or_else(|| ExecutionError::UnknownServerProfile(profile_name.to_string()))?;

        if let Some(previous) = self.current.take() {
            info!("Restarting server ({} -> {})", previous.profile().name(), profile.name());
            previous.stop();
        }

        let app_dir = profile.app_dir(layout);
        let child = Command::new(&self.program)
            .arg("serve")
            .arg("--app-dir")
            .arg(app_dir)
            .arg("--env")
            .arg(profile.environment())
            .arg("--project-dir")
            .arg(&self.working_dir)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ExecutionError::ServerStart(e.to_string()))?;

        info!(
            "Started {} server for {} (pid {})",
            profile.name(),
            app_dir.display(),
            child.id()
        );

        self.current = Some(ServerHandle {
            profile,
            port,
            child,
        });
        Ok(())
    }

    /// URL of the running server
    pub fn base_url(&self) -> Option<String> {
        self.current.as_ref().map(ServerHandle::base_url)
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Stop the running server, if any
    pub fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.stop();
        }
    }
}

impl Drop for ServerScope {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{default_tree, FolderTree};
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn layout() -> Layout {
        Layout::new(FolderTree::build("/project", &default_tree()))
    }

    #[test]
    fn test_profiles() {
        let layout = layout();
        let dev = ServerProfile::from_name("dev").unwrap();
        assert_eq!(dev.environment(), "development");
        assert_eq!(dev.app_dir(&layout), Path::new("/project/app"));

        let build = ServerProfile::from_name("build").unwrap();
        assert_eq!(build.environment(), "test");
        assert_eq!(build.app_dir(&layout), Path::new("/project/working/app"));

        assert_eq!(ServerProfile::from_name("staging"), None);
    }

    #[test]
    fn test_server_receives_app_and_project_dirs() {
        let dir = TempDir::new().unwrap();
        // `sh serve ...` runs the `serve` script from the working directory
        fs::write(dir.path().join("serve"), "echo \"$@\" > args.txt\n").unwrap();
        let mut scope = ServerScope::new("sh", dir.path());

        scope.start("build", &layout(), 3000).unwrap();
        let args_file = dir.path().join("args.txt");
        let mut args = String::new();
        for _ in 0..100 {
            args = fs::read_to_string(&args_file).unwrap_or_default();
            if args.ends_with('\n') {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        scope.stop();

        assert!(args.contains("--app-dir /project/working/app"), "{}", args);
        assert!(args.contains("--env test"), "{}", args);
        assert!(
            args.contains(&format!("--project-dir {}", dir.path().display())),
            "{}",
            args
        );
    }

    #[test]
    fn test_unknown_profile_fails() {
        let dir = TempDir::new().unwrap();
        let mut scope = ServerScope::new("true", dir.path());
        let result = scope.start("staging", &layout(), 3000);
        assert!(matches!(result, Err(ExecutionError::UnknownServerProfile(p)) if p == "staging"));
        assert!(!scope.is_running());
    }

    #[test]
    fn test_start_replace_and_stop() {
        let dir = TempDir::new().unwrap();
        // `true` ignores its arguments and exits immediately
        let mut scope = ServerScope::new("true", dir.path());

        scope.start("dev", &layout(), 3000).unwrap();
        assert_eq!(scope.base_url().as_deref(), Some("http://localhost:3000"));

        scope.start("build", &layout(), 4100).unwrap();
        assert_eq!(scope.base_url().as_deref(), Some("http://localhost:4100"));

        scope.stop();
        assert!(!scope.is_running());
        assert_eq!(scope.base_url(), None);
    }
}
