//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test workspace with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a new test workspace with basic structure
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    // Initialize git repo with main as default branch
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    // Create workspace Cargo.toml
    std::fs::write(
      path.join("Cargo.toml"),
      r#"[workspace]
members = ["crates/*"]
resolver = "2"

[workspace.package]
edition = "2021"
license = "MIT"
"#,
    )?;
    std::fs::write(path.join(".gitignore"), "target/\nCargo.lock\n")?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial workspace setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a crate to the workspace
  ///
  /// `deps` and `dev_deps` name other workspace crates (path dependencies).
  pub fn add_crate(&self, name: &str, deps: &[&str], dev_deps: &[&str]) -> Result<PathBuf> {
    let crate_path = self.path.join("crates").join(name);
    std::fs::create_dir_all(crate_path.join("src"))?;

    let mut cargo_toml = format!(
      r#"[package]
name = "{}"
version = "0.1.0"
edition.workspace = true
license.workspace = true

[dependencies]
"#,
      name
    );
    for dep in deps {
      cargo_toml.push_str(&format!("{} = {{ path = \"../{}\" }}\n", dep, dep));
    }
    cargo_toml.push_str("\n[dev-dependencies]\n");
    for dep in dev_deps {
      cargo_toml.push_str(&format!("{} = {{ path = \"../{}\" }}\n", dep, dep));
    }

    std::fs::write(crate_path.join("Cargo.toml"), cargo_toml)?;
    std::fs::write(
      crate_path.join("src/lib.rs"),
      format!("//! {} crate\n\npub fn hello() -> &'static str {{\n    \"Hello from {}\"\n}}\n", name, name),
    )?;
    std::fs::write(crate_path.join("README.md"), format!("# {}\n", name))?;

    Ok(crate_path)
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Point the default reference branch (refs/remotes/origin/main) at HEAD
  pub fn mark_reference(&self) -> Result<()> {
    git(&self.path, &["update-ref", "refs/remotes/origin/main", "HEAD"])?;
    Ok(())
  }

  /// Write a file relative to a crate
  pub fn modify_file(&self, crate_name: &str, file: &str, content: &str) -> Result<()> {
    let file_path = self.path.join("crates").join(crate_name).join(file);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
  }

  /// Write a file relative to the workspace root
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let file_path = self.path.join(path);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Run `cargo impact plan --format names` and return the built module ids
  pub fn planned_names(&self, extra: &[&str]) -> Result<Vec<String>> {
    let mut args = vec!["impact", "plan", "--format", "names"];
    args.extend_from_slice(extra);
    let output = run_cargo_impact(&self.path, &args)?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run cargo-impact CLI command without checking the exit status
pub fn run_cargo_impact_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let cargo_impact_bin = env!("CARGO_BIN_EXE_cargo-impact");

  Command::new(cargo_impact_bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run cargo-impact")
}

/// Run cargo-impact CLI command, failing on a non-zero exit
pub fn run_cargo_impact(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_cargo_impact_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cargo-impact command failed: cargo {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
