//! Integration tests for the rigger binary

mod common;

use assert_cmd::Command;
use common::{create_project, create_project_with_subdir, write_file, STUB_TOOLS};
use predicates::prelude::*;
use std::fs;

fn rigger() -> Command {
    let mut cmd = Command::cargo_bin("rigger").unwrap();
    cmd.env_remove("RIGGER_LOG");
    cmd
}

#[test]
fn test_help_flag_lists_tasks() {
    rigger()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tasks:"))
        .stdout(predicate::str::contains("monitor"))
        .stdout(predicate::str::contains("--debugMode"));
}

#[test]
fn test_help_task_prints_task_documentation() {
    let project = create_project("");

    rigger()
        .current_dir(project.path())
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tasks for linting, building, testing and packaging starter"))
        .stdout(predicate::str::contains("Supported Tasks:"))
        .stderr(predicate::str::contains("Done, without errors."));
}

#[test]
fn test_env_shows_package_and_tree() {
    let project = create_project("");

    rigger()
        .current_dir(project.path())
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("starter v1.2.3"))
        .stdout(predicate::str::contains(".sass-cache"));
}

#[test]
fn test_config_found_from_subdirectory() {
    let (_project, sub_dir) = create_project_with_subdir("");

    rigger()
        .current_dir(&sub_dir)
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("starter v1.2.3"));
}

#[test]
fn test_invalid_test_target_is_not_an_error() {
    let project = create_project("");

    rigger()
        .current_dir(project.path())
        .arg("test:client:e2e")
        .assert()
        .success()
        .stderr(predicate::str::contains("not applicable for client testing"));
}

#[test]
fn test_unknown_task_fails() {
    let project = create_project("");

    rigger()
        .current_dir(project.path())
        .args(["env", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task 'deploy' is not defined"))
        .stdout(predicate::str::contains("starter v1.2.3").not());
}

#[test]
fn test_unconfigured_tool_fails() {
    let project = create_project("");

    rigger()
        .current_dir(project.path())
        .arg("lint")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no command configured"));
}

#[test]
fn test_unknown_tool_in_config_fails() {
    let project = create_project("tools:\n  deploy: echo deploy\n");

    rigger()
        .current_dir(project.path())
        .arg("env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown tool 'deploy'"));
}

#[test]
fn test_failing_tool_stops_the_plan() {
    let project = create_project("tools:\n  lint: exit 4\n");
    write_file(project.path(), "dist/old.zip", "zip");

    rigger()
        .current_dir(project.path())
        .args(["lint", "clean"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exit code Some(4)"));

    assert!(project.path().join("dist/old.zip").exists());
}

#[test]
fn test_tool_receives_step_variables() {
    let project = create_project("tools:\n  lint: echo \"linting ${files}\"\n");

    rigger()
        .current_dir(project.path())
        .args(["-q", "lint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linting "))
        .stdout(predicate::str::contains("**/*.js"));
}

#[test]
fn test_server_tools_get_dotenv_port_for_both_profiles() {
    for (profile, port) in [("dev", 4555), ("build", 4556)] {
        let project = create_project("tools:\n  test-server: echo \"server url ${base_url}\"\n");
        write_file(project.path(), ".env", &format!("STARTER_PORT={}\n", port));

        rigger()
            .current_dir(project.path())
            .env_remove("STARTER_PORT")
            .arg(format!("test:server:{}", profile))
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "server url http://localhost:{}",
                port
            )));
    }
}

#[test]
fn test_configured_name_without_package_file() {
    let project = create_project("name: demo\n");
    fs::remove_file(project.path().join("package.json")).unwrap();

    rigger()
        .current_dir(project.path())
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("testing and packaging demo"))
        .stderr(predicate::str::contains("placeholder name and version"));
}

#[test]
fn test_clean_removes_artifacts() {
    let project = create_project("");
    let root = project.path();
    write_file(root, "dist/starter_1.2.3.zip", "zip");
    write_file(root, "working/app/static/js/app.min.js", "js");
    write_file(root, "coverage/lcov.info", "");
    write_file(root, "logs/app.log", "line");

    rigger().current_dir(root).arg("clean").assert().success();

    assert!(!root.join("dist").exists());
    assert!(!root.join("working").exists());
    assert!(!root.join("coverage").exists());
    assert!(root.join("logs").is_dir());
    assert!(!root.join("logs/app.log").exists());
    assert!(root.join("app/static/css/main.css").exists());
}

#[test]
fn test_build_produces_minified_bundle() {
    let project = create_project(STUB_TOOLS);
    let root = project.path();
    write_file(root, "dist/stale.zip", "zip");

    rigger().current_dir(root).arg("build").assert().success();

    let bundle = root.join("working/app/static/css/app.min.css");
    let css = fs::read_to_string(&bundle).unwrap();
    assert!(css.starts_with("/*! [starter v1.2.3] Built: "));
    assert!(css.ends_with("body{margin:0}"));

    assert!(!root.join("working/app/static/css/main.css").exists());
    assert!(!root.join("working/app/static/js/app.js").exists());
    assert!(root.join("working/package.json").exists());
    assert!(root.join("working/app/views/index.html").exists());
    assert!(!root.join("dist").exists());
}

#[test]
fn test_debug_build_skips_minification() {
    let project = create_project(STUB_TOOLS);
    let root = project.path();

    rigger()
        .current_dir(root)
        .arg("build:debugMode")
        .assert()
        .success()
        .stderr(predicate::str::contains("debug mode"));

    let css = fs::read_to_string(root.join("working/app/static/css/app.min.css")).unwrap();
    assert!(css.contains("margin: 0 ;"));
}

#[test]
fn test_debug_option_overrides_sub_target() {
    let project = create_project(STUB_TOOLS);
    let root = project.path();

    rigger()
        .current_dir(root)
        .args(["--debugMode=false", "build:debugMode"])
        .assert()
        .success();

    let css = fs::read_to_string(root.join("working/app/static/css/app.min.css")).unwrap();
    assert!(css.starts_with("/*! [starter v1.2.3]"));
}

#[test]
fn test_bump_minor_rewrites_version() {
    let project = create_project("");
    let root = project.path();

    rigger().current_dir(root).arg("bump:minor").assert().success();

    let package: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("package.json")).unwrap()).unwrap();
    assert_eq!(package["version"], "1.3.0");
    assert_eq!(package["private"], true);
}

#[test]
fn test_bump_with_unknown_part_changes_nothing() {
    let project = create_project("");
    let root = project.path();

    rigger()
        .current_dir(root)
        .arg("bump:huge")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unrecognized version component [huge]"));

    let contents = fs::read_to_string(root.join("package.json")).unwrap();
    assert!(contents.contains("\"version\": \"1.2.3\""));
}

#[test]
fn test_silent_suppresses_banners() {
    let project = create_project("");

    rigger()
        .current_dir(project.path())
        .args(["-s", "clean"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_explicit_config_file() {
    let project = create_project("");
    let other = tempfile::TempDir::new().unwrap();

    rigger()
        .current_dir(other.path())
        .arg("-f")
        .arg(project.path().join("rigger.yml"))
        .arg("env")
        .assert()
        .success()
        .stdout(predicate::str::contains("starter v1.2.3"));
}

#[test]
fn test_completions() {
    rigger()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rigger"));
}
