//! Integration tests for `cargo impact plan`

use crate::helpers::{TestWorkspace, git, run_cargo_impact};
use anyhow::Result;

/// lib-a ← lib-b (lib-b depends on lib-a), lib-c standalone
fn three_crates() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib-a", &[], &[])?;
  ws.add_crate("lib-b", &["lib-a"], &[])?;
  ws.add_crate("lib-c", &[], &[])?;
  ws.commit("Add crates")?;
  ws.mark_reference()?;
  Ok(ws)
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
  names.sort();
  names
}

#[test]
fn test_committed_change_rebuilds_dependents() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-a", "src/lib.rs", "pub fn hello() -> &'static str { \"Modified\" }\n")?;
  ws.commit("Modify lib-a")?;

  // Build order: dependency first
  assert_eq!(ws.planned_names(&[])?, vec!["lib-a", "lib-b"]);
  Ok(())
}

#[test]
fn test_no_changes_builds_nothing() -> Result<()> {
  let ws = three_crates()?;

  assert!(ws.planned_names(&[])?.is_empty());

  let output = run_cargo_impact(&ws.path, &["impact", "plan"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Nothing to build"), "got: {}", stdout);
  Ok(())
}

#[test]
fn test_text_plan_shows_module_neighbors() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-a", "src/lib.rs", "pub fn a() {}\n")?;
  ws.commit("Modify lib-a")?;

  let output = run_cargo_impact(&ws.path, &["impact", "plan"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("📦 lib-a (used by lib-b)"), "got: {}", stdout);
  assert!(stdout.contains("needs: lib-a"), "got: {}", stdout);
  Ok(())
}

#[test]
fn test_leaf_change_builds_only_itself() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-b", "src/lib.rs", "pub fn b() {}\n")?;
  ws.commit("Modify lib-b")?;

  assert_eq!(ws.planned_names(&[])?, vec!["lib-b"]);
  Ok(())
}

#[test]
fn test_files_outside_crates_are_ignored() -> Result<()> {
  let ws = three_crates()?;
  ws.write_file("docs/guide.md", "# Guide\n")?;
  ws.commit("Add docs")?;

  assert!(ws.planned_names(&[])?.is_empty());
  Ok(())
}

#[test]
fn test_merge_base_comparison() -> Result<()> {
  let ws = three_crates()?;

  // Reference branch moves on with a change to lib-c
  git(&ws.path, &["checkout", "-b", "other"])?;
  ws.modify_file("lib-c", "src/lib.rs", "pub fn c() {}\n")?;
  ws.commit("Modify lib-c on other")?;
  ws.mark_reference()?;

  // Our branch changes lib-a
  git(&ws.path, &["checkout", "main"])?;
  ws.modify_file("lib-a", "src/lib.rs", "pub fn a() {}\n")?;
  ws.commit("Modify lib-a on main")?;

  // Merge-base: only our own changes count
  assert_eq!(sorted(ws.planned_names(&[])?), vec!["lib-a", "lib-b"]);

  // Direct comparison also sees the reference branch's changes
  assert_eq!(
    sorted(ws.planned_names(&["--set", "compare-to-merge-base=false"])?),
    vec!["lib-a", "lib-b", "lib-c"]
  );
  Ok(())
}

#[test]
fn test_uncommitted_and_untracked_changes() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-c", "src/lib.rs", "pub fn c() {}\n")?;
  ws.modify_file("lib-b", "src/extra.rs", "pub fn extra() {}\n")?;

  assert_eq!(sorted(ws.planned_names(&[])?), vec!["lib-b", "lib-c"]);
  assert_eq!(ws.planned_names(&["--set", "untracked=false"])?, vec!["lib-c"]);
  assert_eq!(ws.planned_names(&["--set", "uncommitted=false"])?, vec!["lib-b"]);
  assert!(
    ws.planned_names(&["--set", "uncommitted=false", "--set", "untracked=false"])?
      .is_empty()
  );
  Ok(())
}

#[test]
fn test_ignore_changed_patterns() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-a", "README.md", "# lib-a\n\nUpdated docs.\n")?;
  ws.commit("Docs only")?;

  assert_eq!(ws.planned_names(&[])?, vec!["lib-a", "lib-b"]);
  assert!(ws.planned_names(&["--set", "ignore-changed=**/*.md"])?.is_empty());
  assert!(
    ws.planned_names(&["--set", "ignore-changed=regex:README\\.md$"])?
      .is_empty()
  );
  Ok(())
}

#[test]
fn test_ignored_projects() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-a", "src/lib.rs", "pub fn a() {}\n")?;
  ws.modify_file("lib-c", "src/lib.rs", "pub fn c() {}\n")?;
  ws.commit("Modify lib-a and lib-c")?;

  assert_eq!(ws.planned_names(&["--set", "ignored-projects=lib-c"])?, vec!["lib-a", "lib-b"]);
  Ok(())
}

#[test]
fn test_dev_dependencies_are_impacted() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("fixtures", &[], &[])?;
  ws.add_crate("engine", &[], &["fixtures"])?;
  ws.commit("Add crates")?;
  ws.mark_reference()?;

  ws.modify_file("fixtures", "src/lib.rs", "pub fn f() {}\n")?;
  ws.commit("Modify fixtures")?;

  assert_eq!(sorted(ws.planned_names(&[])?), vec!["engine", "fixtures"]);
  Ok(())
}

#[test]
fn test_also_make_with_skipped_tests() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-b", "src/lib.rs", "pub fn b() {}\n")?;
  ws.commit("Modify lib-b")?;

  assert_eq!(ws.planned_names(&["--also-make"])?, vec!["lib-a", "lib-b"]);

  let output = run_cargo_impact(
    &ws.path,
    &[
      "impact",
      "plan",
      "--also-make",
      "--format",
      "json",
      "--set",
      "skip-tests-for-not-impacted-modules=true",
    ],
  )?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let build = json["build"].as_array().expect("build array");
  assert_eq!(build.len(), 2);
  assert_eq!(build[0]["id"], "lib-a");
  assert_eq!(build[0]["testsSkipped"], true);
  assert_eq!(build[0]["reasons"], serde_json::json!(["upstreamDependency"]));
  assert_eq!(build[1]["id"], "lib-b");
  assert_eq!(build[1]["testsSkipped"], false);
  assert_eq!(json["excluded"][0]["id"], "lib-c");
  assert_eq!(json["changedFiles"]["committed"], serde_json::json!(["crates/lib-b/src/lib.rs"]));
  Ok(())
}

#[test]
fn test_build_all() -> Result<()> {
  let ws = three_crates()?;
  assert_eq!(
    sorted(ws.planned_names(&["--set", "build-all=true"])?),
    vec!["lib-a", "lib-b", "lib-c"]
  );
  Ok(())
}

#[test]
fn test_disabled_builds_everything_without_git() -> Result<()> {
  let ws = three_crates()?;
  // The reference does not exist; it is never consulted
  let names = ws.planned_names(&["--set", "enabled=false", "--set", "reference-branch=refs/remotes/nowhere/main"])?;
  assert_eq!(sorted(names), vec!["lib-a", "lib-b", "lib-c"]);
  Ok(())
}

#[test]
fn test_output_file() -> Result<()> {
  let ws = three_crates()?;
  ws.modify_file("lib-a", "src/lib.rs", "pub fn a() {}\n")?;
  ws.commit("Modify lib-a")?;

  ws.planned_names(&["--set", "output-file=target/impact/changed.txt"])?;
  assert_eq!(ws.read_file("target/impact/changed.txt")?, "crates/lib-a\ncrates/lib-b\n");

  ws.planned_names(&[
    "--set",
    "output-file=target/impact/skipped.txt",
    "--set",
    "write-changed=false",
  ])?;
  assert_eq!(ws.read_file("target/impact/skipped.txt")?, "crates/lib-c\n");
  Ok(())
}

#[test]
fn test_output_file_failure_is_not_fatal() -> Result<()> {
  let ws = three_crates()?;
  ws.write_file("target/blocker", "")?;
  ws.modify_file("lib-c", "src/lib.rs", "pub fn c() {}\n")?;
  ws.commit("Modify lib-c")?;

  let names = ws.planned_names(&["--set", "output-file=target/blocker/out.txt"])?;
  assert_eq!(names, vec!["lib-c"]);
  assert!(!ws.file_exists("target/blocker/out.txt"));
  Ok(())
}

#[test]
fn test_json_project_model() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("svc/core/core.txt", "core\n")?;
  ws.write_file("svc/api/api.txt", "api\n")?;
  ws.write_file("tools/tool.txt", "tool\n")?;
  ws.write_file(
    "impact-model.json",
    r#"{
  "properties": { "untracked": false },
  "modules": [
    { "id": "platform", "path": "." },
    { "id": "core", "path": "svc/core", "parent": "platform" },
    { "id": "api", "path": "svc/api", "dependencies": ["core"], "parent": "platform" },
    { "id": "tools", "path": "tools" }
  ]
}"#,
  )?;
  ws.commit("Add model")?;
  ws.mark_reference()?;

  ws.write_file("svc/core/core.txt", "core v2\n")?;
  ws.commit("Modify core")?;

  assert_eq!(
    ws.planned_names(&["--model", "impact-model.json"])?,
    vec!["core", "api"]
  );

  // A change at the root belongs to the parent, which rebuilds its children
  ws.write_file("NOTES.txt", "notes\n")?;
  ws.commit("Root change")?;
  assert_eq!(
    sorted(ws.planned_names(&["--model", "impact-model.json"])?),
    vec!["api", "core", "platform"]
  );
  Ok(())
}
