//! Integration tests for the command-line interface

#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::Project;
use predicates::prelude::*;

fn arbor(project: &Project) -> Command {
    let mut cmd = Command::cargo_bin("arbor").unwrap();
    cmd.arg("-C").arg(project.root()).env_remove("ARBOR_LOG");
    cmd
}

fn sample_project() -> Project {
    let project = Project::new();
    project.write(
        "root.arbor",
        r#"
Variables:
  mode: debug
Tasks:
  - Name: lint
    Command: [touch, lint.txt]
"#,
    );
    project.write(
        "app/app.arbor",
        r#"
Tasks:
  - Name: app.build
    Command: [sh, -c, 'echo "$0" > build.txt', '{{ var "mode" }}']
  - Name: app.test
    Command: [touch, test.txt]
"#,
    );
    project
}

#[test]
fn test_find_lists_all_tasks_by_default() {
    let project = sample_project();

    arbor(&project)
        .arg("find")
        .assert()
        .success()
        .stdout(predicate::str::contains("lint in"))
        .stdout(predicate::str::contains("app.build in"))
        .stdout(predicate::str::contains("app.test in"));
}

#[test]
fn test_find_with_pattern() {
    let project = sample_project();

    arbor(&project)
        .args(["find", "app.*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app.build"))
        .stdout(predicate::str::contains("lint").not());
}

#[test]
fn test_run_resolves_inherited_variables() {
    let project = sample_project();

    arbor(&project)
        .args(["--quiet", "run", "app.build"])
        .assert()
        .success();

    assert_eq!(project.read("app/build.txt"), "debug");
    assert!(!project.exists("app/test.txt"));
    assert!(!project.exists("lint.txt"));
}

#[test]
fn test_run_prints_task_banner() {
    let project = sample_project();

    arbor(&project)
        .args(["run", "lint"])
        .assert()
        .success()
        .stderr(predicate::str::contains("-------- lint --------"));
}

#[test]
fn test_run_exits_non_zero_on_failure() {
    let project = Project::new();
    project.write(
        "tasks.arbor",
        "Tasks:\n  - Name: fail\n    Command: ['false']\n",
    );

    arbor(&project)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("fail"));
}

#[test]
fn test_exclude_skips_directory() {
    let project = sample_project();

    arbor(&project)
        .args(["--exclude", "app", "find"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("app.").not());
}

#[test]
fn test_env_file_feeds_env_function() {
    let project = Project::new();
    project.write(
        "tasks.arbor",
        r#"
Tasks:
  - Name: show
    Command: [sh, -c, 'echo "$0" > out.txt', '{{ env "ARBOR_TEST_VALUE" }}']
"#,
    );
    let env_file = project.write("vars.env", "ARBOR_TEST_VALUE=from-dotenv\n");

    arbor(&project)
        .arg("--env-file")
        .arg(&env_file)
        .arg("run")
        .env_remove("ARBOR_TEST_VALUE")
        .assert()
        .success();

    assert_eq!(project.read("out.txt"), "from-dotenv");
}

#[test]
fn test_missing_directory_fails() {
    Command::cargo_bin("arbor")
        .unwrap()
        .args(["-C", "/definitely/not/here/arbor", "find"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("arbor")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arbor"));
}
