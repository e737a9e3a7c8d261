//! Change source resolution
//!
//! Determines the two end-points of the comparison and enumerates changed
//! paths, partitioned into committed, uncommitted and untracked sets:
//!
//! ```text
//! head       = HEAD, or the tip of base-branch
//! reference  = tip of reference-branch
//! from       = merge-base(head, reference) | reference
//! committed  = git diff from head
//! working    = git status (uncommitted / untracked, when enabled)
//! ```
//!
//! Optional fetches of the reference/base branch run first and are fatal on
//! failure. Ignore patterns apply to every category.

use crate::core::config::{ImpactConfig, Property};
use crate::core::error::{ConfigError, ImpactResult};
use crate::core::patterns::PatternSet;
use crate::core::vcs::SystemGit;
use crate::utils::path_to_git_format;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Changed paths (repository-relative), in three disjoint sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
  pub committed: BTreeSet<PathBuf>,
  pub uncommitted: BTreeSet<PathBuf>,
  pub untracked: BTreeSet<PathBuf>,
}

impl ChangeSet {
  /// Partition raw paths, dropping ignored ones.
  ///
  /// A path lands in the first category that lists it
  /// (committed, then uncommitted, then untracked).
  pub fn partition(
    committed: impl IntoIterator<Item = PathBuf>,
    uncommitted: impl IntoIterator<Item = PathBuf>,
    untracked: impl IntoIterator<Item = PathBuf>,
    ignore: &PatternSet,
  ) -> Self {
    let keep = |path: &PathBuf| {
      let ignored = ignore.matches(&path_to_git_format(path));
      if ignored {
        tracing::debug!(path = %path.display(), "ignoring changed path");
      }
      !ignored
    };

    let committed: BTreeSet<PathBuf> = committed.into_iter().filter(|p| keep(p)).collect();
    let uncommitted: BTreeSet<PathBuf> = uncommitted
      .into_iter()
      .filter(|p| keep(p) && !committed.contains(p))
      .collect();
    let untracked: BTreeSet<PathBuf> = untracked
      .into_iter()
      .filter(|p| keep(p) && !committed.contains(p) && !uncommitted.contains(p))
      .collect();

    Self {
      committed,
      uncommitted,
      untracked,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.committed.is_empty() && self.uncommitted.is_empty() && self.untracked.is_empty()
  }

  pub fn len(&self) -> usize {
    self.committed.len() + self.uncommitted.len() + self.untracked.len()
  }

  /// Every changed path.
  pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
    self.committed.iter().chain(&self.uncommitted).chain(&self.untracked)
  }

  /// Every changed path, anchored at the work tree.
  pub fn absolute(&self, work_tree: &Path) -> Vec<PathBuf> {
    self.all().map(|p| work_tree.join(p)).collect()
  }
}

/// A remote-tracking branch split into remote name and branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
  pub remote: String,
  pub branch: String,
}

impl RemoteBranch {
  /// Parse `refs/remotes/<remote>/<branch>` or `<remote>/<branch>` for a known remote.
  pub fn parse(reference: &str, remotes: &[String]) -> Option<Self> {
    let short = reference.strip_prefix("refs/remotes/").unwrap_or(reference);
    let (remote, branch) = short.split_once('/')?;
    if branch.is_empty() || !remotes.iter().any(|r| r == remote) {
      return None;
    }
    Some(Self {
      remote: remote.to_string(),
      branch: branch.to_string(),
    })
  }
}

/// Resolves a `ChangeSet` from git according to the configuration.
pub struct ChangeResolver<'a> {
  git: &'a SystemGit,
  config: &'a ImpactConfig,
}

impl<'a> ChangeResolver<'a> {
  pub fn new(git: &'a SystemGit, config: &'a ImpactConfig) -> Self {
    Self { git, config }
  }

  pub fn resolve(&self) -> ImpactResult<ChangeSet> {
    let ignore = PatternSet::new(Property::IgnoreChanged, &self.config.ignore_changed)?;

    if self.config.fetch_reference_branch {
      self.fetch(&self.config.reference_branch)?;
    }
    if self.config.fetch_base_branch {
      self.fetch(&self.config.base_branch)?;
    }

    let head = self.git.resolve_commit(&self.config.base_branch)?;
    let reference = self.git.resolve_commit(&self.config.reference_branch)?;

    let from = if self.config.compare_to_merge_base {
      self.git.merge_base(&head, &reference)?
    } else {
      reference.clone()
    };
    tracing::debug!(head = %head, reference = %reference, from = %from, "comparison points");

    let committed = self.git.changed_files_between(&from, &head)?;

    let (uncommitted, untracked) = if self.config.uncommitted || self.config.untracked {
      let status = self.git.working_tree_status()?;
      let uncommitted = if self.config.uncommitted { status.uncommitted } else { vec![] };
      let untracked = if self.config.untracked { status.untracked } else { vec![] };
      (uncommitted, untracked)
    } else {
      (vec![], vec![])
    };

    let changes = ChangeSet::partition(committed, uncommitted, untracked, &ignore);
    tracing::debug!(
      committed = changes.committed.len(),
      uncommitted = changes.uncommitted.len(),
      untracked = changes.untracked.len(),
      "resolved changes"
    );
    Ok(changes)
  }

  fn fetch(&self, reference: &str) -> ImpactResult<()> {
    let remotes = self.git.list_remotes()?;
    let target = RemoteBranch::parse(reference, &remotes).ok_or_else(|| ConfigError::NotFetchable {
      branch: reference.to_string(),
    })?;
    tracing::info!(remote = %target.remote, branch = %target.branch, "fetching branch");
    self
      .git
      .fetch_branch(&target.remote, &target.branch, self.config.ssh_key.as_deref())
  }
}
