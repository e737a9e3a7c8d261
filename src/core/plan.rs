//! Build plan generation
//!
//! Finalizes an impacted set into three groups:
//!
//! ```text
//! build (tests run)      directly changed / downstream modules
//! build (tests skipped)  upstream-only modules, when skip-tests is enabled
//! excluded               everything else
//! ```
//!
//! The plan is the only persisted artifact: optionally written to the
//! configured output file, one module root per line.

use crate::core::config::ImpactConfig;
use crate::core::error::{ImpactResult, ResultExt};
use crate::graph::impact::{ImpactedSet, Reason};
use crate::graph::module_graph::ModuleGraph;
use crate::utils::relative_display;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }

  pub fn full(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// A module retained in the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedModule {
  pub id: String,
  /// Module root, relative to the workspace root (`.` for the root itself)
  pub path: String,
  pub reasons: BTreeSet<Reason>,
  pub tests_skipped: bool,
}

/// A module left out of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedModule {
  pub id: String,
  pub path: String,
}

/// Final build plan: `build` in build order, `excluded` sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
  pub build: Vec<PlannedModule>,
  pub excluded: Vec<ExcludedModule>,
}

impl BuildPlan {
  /// Partition every module of the graph according to the impacted set.
  ///
  /// A module skips tests only when upstream dependency is its sole reason.
  pub fn generate(graph: &ModuleGraph, impacted: &ImpactedSet, skip_tests: bool, root: &Path) -> Self {
    let mut plan = BuildPlan::default();

    for module in graph.modules() {
      let path = relative_display(&module.root, root);
      match impacted.reasons(&module.id) {
        Some(reasons) => plan.build.push(PlannedModule {
          id: module.id.clone(),
          path,
          reasons: reasons.clone(),
          tests_skipped: skip_tests && impacted.is_upstream_only(&module.id),
        }),
        None => plan.excluded.push(ExcludedModule {
          id: module.id.clone(),
          path,
        }),
      }
    }
    plan.excluded.sort_by(|a, b| a.id.cmp(&b.id));

    tracing::info!(
      build = plan.build.len(),
      tests_skipped = plan.tests_skipped().len(),
      excluded = plan.excluded.len(),
      "build plan ready"
    );
    plan
  }

  /// Nothing to build
  pub fn is_empty(&self) -> bool {
    self.build.is_empty()
  }

  /// Built modules whose tests run
  pub fn tested(&self) -> Vec<&PlannedModule> {
    self.build.iter().filter(|m| !m.tests_skipped).collect()
  }

  /// Built modules whose tests are skipped
  pub fn tests_skipped(&self) -> Vec<&PlannedModule> {
    self.build.iter().filter(|m| m.tests_skipped).collect()
  }

  /// Lines persisted to the output file.
  pub fn output_lines(&self, write_changed: bool) -> Vec<&str> {
    if write_changed {
      self.build.iter().map(|m| m.path.as_str()).collect()
    } else {
      self.excluded.iter().map(|m| m.path.as_str()).collect()
    }
  }

  /// Content fingerprint over ids, test flags and exclusions.
  pub fn id(&self) -> PlanId {
    let mut contents = String::new();
    for module in &self.build {
      let mode = if module.tests_skipped { "build" } else { "test" };
      contents.push_str(&format!("{} {}\n", mode, module.id));
    }
    for module in &self.excluded {
      contents.push_str(&format!("skip {}\n", module.id));
    }
    PlanId::from_contents(contents.as_bytes())
  }

  /// Write the plan lines to `path`, overwriting it and creating parent directories.
  pub fn write_output(&self, path: &Path, write_changed: bool) -> ImpactResult<()> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut contents = String::new();
    for line in self.output_lines(write_changed) {
      contents.push_str(line);
      contents.push('\n');
    }

    std::fs::write(path, contents).with_context(|| format!("Failed to write plan to {}", path.display()))?;
    tracing::debug!(path = %path.display(), write_changed, "plan written");
    Ok(())
  }

  /// Persist to the configured output file, if any. Failures are logged, never fatal.
  ///
  /// Returns the written path on success.
  pub fn persist(&self, config: &ImpactConfig) -> Option<PathBuf> {
    let path = config.output_file.as_ref()?;
    match self.write_output(path, config.write_changed) {
      Ok(()) => Some(path.clone()),
      Err(e) => {
        tracing::warn!(path = %path.display(), error = %e, "failed to write plan output file");
        None
      }
    }
  }
}
