//! System git backend - zero dependencies
//!
//! Uses git plumbing commands for every operation the change resolver needs:
//! - Repository discovery (rev-parse --show-toplevel)
//! - Ref resolution and merge-base lookup
//! - Safe subprocess execution (isolated environment)

use crate::core::error::{GitError, ImpactError, ImpactResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root (canonical)
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  ///
  /// This performs ONE subprocess call to locate the work tree.
  pub fn open(path: &Path) -> ImpactResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      return Err(ImpactError::Git(GitError::RepoNotFound {
        path: path.to_path_buf(),
      }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let top_level = PathBuf::from(stdout.trim());
    let work_tree = top_level.canonicalize().unwrap_or(top_level);

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree,
    })
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Resolve a ref (branch, remote-tracking ref, SHA, `HEAD`) to a commit SHA
  pub fn resolve_commit(&self, reference: &str) -> ImpactResult<String> {
    let spec = format!("{}^{{commit}}", reference);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &spec])
      .output()
      .context("Failed to run git rev-parse")?;

    if !output.status.success() {
      return Err(ImpactError::Git(GitError::RefNotFound {
        reference: reference.to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Nearest common ancestor of two commits
  pub fn merge_base(&self, a: &str, b: &str) -> ImpactResult<String> {
    let output = self
      .git_cmd()
      .args(["merge-base", a, b])
      .output()
      .context("Failed to run git merge-base")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ImpactError::Git(GitError::CommandFailed {
        command: format!("git merge-base {} {}", a, b),
        stderr: if stderr.trim().is_empty() {
          "no common ancestor".to_string()
        } else {
          stderr.to_string()
        },
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    // Set working directory
    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}
