//! Container environment tests against a stand-in runtime executable.
//!
//! The stand-in is a shell script that answers `inspect` for one container
//! name and runs `exec` commands on the host in the requested directory, so
//! the docker code path runs without a daemon. Everything lives in a single
//! test so the script is never executed while another thread holds it open.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use swe_submit::environment::{resolve_environment, EnvironmentConfig, EnvironmentKind};
use swe_submit::model::ModelConfig;
use swe_submit::submission::{extract_patch, SubmissionBridge};
use swe_submit::{BridgeConfig, EnvironmentError, TaskInstance};

const CONTAINER: &str = "swe-task";

const RUNTIME_SCRIPT: &str = r#"#!/bin/sh
echo "$1" >> "$(dirname "$0")/calls.log"
case "$1" in
  inspect)
    for last; do :; done
    if [ "$last" = "swe-task" ]; then
      echo true
      exit 0
    fi
    echo "Error: No such object: $last" >&2
    exit 1
    ;;
  exec)
    shift
    while [ $# -gt 0 ]; do
      case "$1" in
        -w) workdir=$2; shift 2 ;;
        -e) export "$2"; shift 2 ;;
        *) break ;;
      esac
    done
    shift 3
    cd "$workdir" || exit 125
    exec sh -c "$1"
    ;;
  *)
    echo "Error response from daemon: unsupported command $1" >&2
    exit 125
    ;;
esac
"#;

fn install_runtime(dir: &Path) -> PathBuf {
    let path = dir.join("fake-docker");
    std::fs::write(&path, RUNTIME_SCRIPT).expect("write runtime");
    let mut permissions = std::fs::metadata(&path).expect("metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("chmod");
    path
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=swe-submit",
            "-c",
            "user.email=swe-submit@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git should be installed");
    assert!(status.success(), "git {:?} failed", args);
}

#[test]
fn test_docker_name_resolves_to_container_handle() {
    let runtime_dir = tempfile::tempdir().expect("tempdir");
    let runtime = install_runtime(runtime_dir.path());

    let repo = tempfile::tempdir().expect("tempdir");
    git(repo.path(), &["init", "-q"]);
    std::fs::write(repo.path().join("a.txt"), "one\n").expect("write");
    git(repo.path(), &["add", "-A"]);
    git(repo.path(), &["commit", "-q", "-m", "initial"]);
    std::fs::write(repo.path().join("fix.py"), "x = 1\n").expect("write");

    let config = EnvironmentConfig::default()
        .with_executable(runtime.display().to_string())
        .with_container_id(CONTAINER)
        .with_cwd(repo.path())
        .with_env("SWE_SUBMIT_MARKER", "inside");

    let env = resolve_environment("docker".into(), None, &config).expect("resolve docker");
    assert_eq!(env.kind(), EnvironmentKind::Container);
    assert_eq!(env.cwd(), repo.path());

    let result = env
        .execute("echo err >&2; printf '%s\\n' \"$SWE_SUBMIT_MARKER\"; exit 3")
        .expect("execute");
    assert_eq!(result.exit_status, 3);
    assert_eq!(result.output, "err\ninside\n");

    // A command of its own exiting 125 is not a runtime failure.
    let result = env.execute("exit 125").expect("execute");
    assert_eq!(result.exit_status, 125);

    let patch = extract_patch(env.as_ref()).expect("patch");
    assert!(patch.succeeded());
    assert!(patch.text.starts_with("diff --git a/fix.py b/fix.py"));
    assert_eq!(patch.touched_files(), vec!["fix.py"]);
    drop(env);

    let bridge_config = BridgeConfig {
        model: ModelConfig::default().with_model_name("gpt-4o"),
        environment: config.clone().with_environment_class("docker"),
        ..BridgeConfig::default()
    };
    let submission = SubmissionBridge::new()
        .format_submission(&TaskInstance::new("repo__issue-123"), &bridge_config)
        .expect("submission");
    assert_eq!(submission.model_patch(), patch.text);

    let missing = config.with_container_id("gone");
    assert!(matches!(
        resolve_environment("docker".into(), None, &missing),
        Err(EnvironmentError::EnvironmentUnavailable(_))
    ));

    let calls = std::fs::read_to_string(runtime_dir.path().join("calls.log")).expect("calls");
    let calls: Vec<&str> = calls.lines().collect();
    assert!(calls.contains(&"inspect"));
    assert!(calls.contains(&"exec"));
    // Attached containers belong to someone else.
    assert!(!calls.contains(&"rm"));
}
