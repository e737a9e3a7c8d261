//! Additional operations for SystemGit (diffs, status, remotes, fetch)

use super::system_git::SystemGit;
use crate::core::error::{GitError, ImpactError, ImpactResult, ResultExt};
use std::path::{Path, PathBuf};

/// Working tree changes relative to HEAD (repository-relative paths)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
  /// Tracked files modified in the index or the work tree
  pub uncommitted: Vec<PathBuf>,
  /// Files git does not track and does not ignore
  pub untracked: Vec<PathBuf>,
}

impl SystemGit {
  /// Paths that differ between two commits
  ///
  /// Renames are reported as a delete plus an add so both owners see the change.
  pub fn changed_files_between(&self, from: &str, to: &str) -> ImpactResult<Vec<PathBuf>> {
    let output = self
      .git_cmd()
      .args(["diff", "--name-only", "--no-renames", "-z", from, to])
      .output()
      .context("Failed to run git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ImpactError::Git(GitError::CommandFailed {
        command: format!("git diff {} {}", from, to),
        stderr: stderr.to_string(),
      }));
    }

    Ok(
      split_nul(&output.stdout)
        .map(|entry| PathBuf::from(entry.as_ref()))
        .collect(),
    )
  }

  /// Uncommitted and untracked files in the work tree
  pub fn working_tree_status(&self) -> ImpactResult<WorkingTreeStatus> {
    let output = self
      .git_cmd()
      .args(["status", "--porcelain=v1", "-z", "--untracked-files=all", "--no-renames"])
      .output()
      .context("Failed to run git status")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ImpactError::Git(GitError::CommandFailed {
        command: "git status".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(parse_porcelain_status(&output.stdout))
  }

  /// List remote names
  pub fn list_remotes(&self) -> ImpactResult<Vec<String>> {
    let output = self.git_cmd().arg("remote").output().context("Failed to list remotes")?;

    if !output.status.success() {
      return Ok(vec![]);
    }

    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
    )
  }

  /// Update `refs/remotes/<remote>/<branch>` from the remote
  ///
  /// Authentication or network failures are fatal and never retried.
  pub fn fetch_branch(&self, remote: &str, branch: &str, ssh_key: Option<&Path>) -> ImpactResult<()> {
    let refspec = format!("+refs/heads/{}:refs/remotes/{}/{}", branch, remote, branch);
    tracing::debug!(remote, refspec = %refspec, "fetching");

    let mut cmd = self.git_cmd();
    cmd.envs(fetch_env(ssh_key, |name| std::env::var(name).ok()));

    let output = cmd
      .args(["fetch", "--no-tags", remote, &refspec])
      .output()
      .context("Failed to run git fetch")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ImpactError::Git(GitError::AccessFailed {
        remote: remote.to_string(),
        reason: stderr.to_string(),
      }));
    }

    Ok(())
  }
}

/// Environment ssh needs on top of the isolated git environment.
///
/// The agent socket always passes through. A configured key pins the ssh
/// command; otherwise the caller's own `GIT_SSH_COMMAND`/`GIT_SSH` apply.
pub(crate) fn fetch_env(ssh_key: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Vec<(String, String)> {
  let mut env = Vec::new();
  if let Some(socket) = lookup("SSH_AUTH_SOCK") {
    env.push(("SSH_AUTH_SOCK".to_string(), socket));
  }

  match ssh_key {
    Some(key) => env.push((
      "GIT_SSH_COMMAND".to_string(),
      format!("ssh -i {} -o IdentitiesOnly=yes", shell_quote(&key.to_string_lossy())),
    )),
    None => {
      for name in ["GIT_SSH_COMMAND", "GIT_SSH"] {
        if let Some(value) = lookup(name) {
          env.push((name.to_string(), value));
        }
      }
    }
  }
  env
}

/// Single-quote for `sh`; embedded quotes become `'\''`.
fn shell_quote(raw: &str) -> String {
  format!("'{}'", raw.replace('\'', r"'\''"))
}

fn split_nul(data: &[u8]) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
  data
    .split(|b| *b == 0)
    .filter(|entry| !entry.is_empty())
    .map(String::from_utf8_lossy)
}

/// Parse `git status --porcelain=v1 -z` output
///
/// Each entry is `XY <path>`; rename/copy entries carry the source path as an
/// extra NUL-terminated field, which is reported as changed too.
pub(crate) fn parse_porcelain_status(data: &[u8]) -> WorkingTreeStatus {
  let mut status = WorkingTreeStatus::default();
  let mut entries = split_nul(data);

  while let Some(entry) = entries.next() {
    if entry.len() < 4 {
      continue;
    }
    let (code, path) = entry.split_at(3);
    let code = code.trim_end();

    match code {
      "??" => status.untracked.push(PathBuf::from(path)),
      "!!" => {}
      _ => {
        status.uncommitted.push(PathBuf::from(path));
        if code.starts_with('R') || code.starts_with('C') {
          if let Some(source) = entries.next() {
            status.uncommitted.push(PathBuf::from(source.as_ref()));
          }
        }
      }
    }
  }

  status
}
