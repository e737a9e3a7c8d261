//! Integration tests for reference resolution and fetching

use crate::helpers::{TestWorkspace, git, run_cargo_impact_raw};
use anyhow::Result;
use tempfile::TempDir;

fn workspace_with_remote() -> Result<(TestWorkspace, TempDir)> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", &[], &[])?;
  ws.add_crate("lib-b", &["lib-a"], &[])?;
  ws.commit("Add crates")?;

  let remote = TempDir::new()?;
  git(remote.path(), &["init", "--bare", "--initial-branch=main"])?;
  let remote_path = remote.path().to_string_lossy().to_string();
  git(&ws.path, &["remote", "add", "origin", &remote_path])?;
  git(&ws.path, &["push", "origin", "main"])?;

  Ok((ws, remote))
}

#[test]
fn test_missing_reference_branch_is_a_git_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", &[], &[])?;
  ws.commit("Add lib-a")?;

  let output = run_cargo_impact_raw(&ws.path, &["impact", "plan"])?;
  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("refs/remotes/origin/main"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_outside_repository_is_a_git_error() -> Result<()> {
  let dir = TempDir::new()?;
  std::fs::write(dir.path().join("model.json"), r#"{ "modules": [ { "id": "x", "path": "." } ] }"#)?;

  let output = run_cargo_impact_raw(dir.path(), &["impact", "plan", "--model", "model.json"])?;
  assert_eq!(output.status.code(), Some(2));
  Ok(())
}

#[test]
fn test_fetch_reference_branch() -> Result<()> {
  let (ws, remote) = workspace_with_remote()?;

  // Someone else pushes a change to lib-b; our clone has never seen it
  let other = TempDir::new()?;
  let remote_path = remote.path().to_string_lossy().to_string();
  git(other.path(), &["clone", &remote_path, "clone"])?;
  let clone = other.path().join("clone");
  git(&clone, &["config", "user.name", "Other User"])?;
  git(&clone, &["config", "user.email", "other@example.com"])?;
  std::fs::write(clone.join("crates/lib-b/src/lib.rs"), "pub fn b() {}\n")?;
  git(&clone, &["commit", "-am", "Modify lib-b upstream"])?;
  git(&clone, &["push", "origin", "main"])?;

  // Without fetching, origin/main equals HEAD: nothing to build
  let output = run_cargo_impact_raw(
    &ws.path,
    &["impact", "plan", "--format", "names", "--set", "compare-to-merge-base=false"],
  )?;
  assert!(output.status.success());
  assert!(String::from_utf8_lossy(&output.stdout).trim().is_empty());

  // After fetching, the upstream change is part of the comparison
  let output = run_cargo_impact_raw(
    &ws.path,
    &[
      "impact",
      "plan",
      "--format",
      "names",
      "--set",
      "compare-to-merge-base=false",
      "--set",
      "fetch-reference-branch=true",
    ],
  )?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "lib-b");
  Ok(())
}

#[test]
fn test_fetch_restores_missing_tracking_ref() -> Result<()> {
  let (ws, _remote) = workspace_with_remote()?;
  git(&ws.path, &["update-ref", "-d", "refs/remotes/origin/main"])?;

  let output = run_cargo_impact_raw(&ws.path, &["impact", "plan"])?;
  assert_eq!(output.status.code(), Some(2));

  let output = run_cargo_impact_raw(&ws.path, &["impact", "plan", "--set", "fetch-reference-branch=true"])?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  Ok(())
}

#[test]
fn test_unreachable_remote_is_a_git_error() -> Result<()> {
  let (ws, remote) = workspace_with_remote()?;
  let missing = remote.path().join("does-not-exist.git");
  git(&ws.path, &["remote", "set-url", "origin", &missing.to_string_lossy()])?;

  let output = run_cargo_impact_raw(&ws.path, &["impact", "plan", "--set", "fetch-reference-branch=true"])?;
  assert_eq!(output.status.code(), Some(2));
  Ok(())
}

#[test]
fn test_local_branch_cannot_be_fetched() -> Result<()> {
  let (ws, _remote) = workspace_with_remote()?;

  // base-branch defaults to HEAD, which is not a remote-tracking ref
  let output = run_cargo_impact_raw(&ws.path, &["impact", "plan", "--set", "fetch-base-branch=true"])?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}
