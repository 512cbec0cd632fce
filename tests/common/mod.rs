//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PACKAGE_JSON: &str = r#"{
  "name": "starter",
  "version": "1.2.3",
  "private": true
}
"#;

/// Tool section that stands in for the external tools with no-op commands
pub const STUB_TOOLS: &str = r#"
tools:
  beautify: "true"
  format-styles: "true"
  lint: "true"
  templates: "true"
  bundle: "true"
  styles: "true"
  test-client: "true"
"#;

/// Write a file, creating its parent folders
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Create a project with package.json, a rigger.yml and a minimal app folder
pub fn create_project(config: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(root, "package.json", PACKAGE_JSON);
    write_file(root, "rigger.yml", config);
    write_file(root, "app/static/css/main.css", "body {\n  margin: 0 ;\n}\n");
    write_file(root, "app/static/js/app.js", "define([], function () {});\n");
    write_file(root, "app/views/index.html", "<html></html>\n");

    for folder in ["test/client", "test/e2e", "test/server", "test/mocks", "logs"] {
        fs::create_dir_all(root.join(folder)).unwrap();
    }

    temp_dir
}

/// Create a test config in a subdirectory of a project
pub fn create_project_with_subdir(config: &str) -> (TempDir, PathBuf) {
    let temp_dir = create_project(config);
    let sub_dir = temp_dir.path().join("app").join("static");
    (temp_dir, sub_dir)
}
