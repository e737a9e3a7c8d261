//! Lightweight module values translated from the host project model

use std::collections::BTreeSet;
use std::path::PathBuf;

/// A buildable unit within the multi-module tree.
///
/// Populated once from the host model (cargo metadata, JSON model) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
  /// Unique id (package name for Cargo)
  pub id: String,
  /// Absolute module root directory
  pub root: PathBuf,
  /// Ids this module needs in order to build
  pub dependencies: BTreeSet<String>,
  /// Ids this module needs only for its tests (Cargo dev-dependencies)
  pub test_dependencies: BTreeSet<String>,
  /// Parent/aggregator id
  pub parent: Option<String>,
}

impl Module {
  pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    Self {
      id: id.into(),
      root: root.into(),
      dependencies: BTreeSet::new(),
      test_dependencies: BTreeSet::new(),
      parent: None,
    }
  }

  pub fn depends_on<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies.extend(ids.into_iter().map(Into::into));
    self
  }

  pub fn test_depends_on<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.test_dependencies.extend(ids.into_iter().map(Into::into));
    self
  }

  pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
    self.parent = Some(parent.into());
    self
  }
}
