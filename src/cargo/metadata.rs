use crate::core::config::PropertySource;
use crate::core::error::{ImpactResult, ResultExt};
use crate::graph::module::Module;
use cargo_metadata::{DependencyKind, MetadataCommand, Package};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Key under `[workspace.metadata]` holding impact properties
pub const METADATA_KEY: &str = "impact";

/// Workspace introspection using cargo_metadata
#[derive(Clone)]
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  /// Load metadata for the workspace containing `dir` (workspace members only).
  pub fn load(dir: &Path) -> ImpactResult<Self> {
    let metadata = MetadataCommand::new()
      .current_dir(dir)
      .no_deps()
      .exec()
      .with_context(|| format!("Failed to load cargo metadata in {}", dir.display()))?;
    Ok(Self { metadata })
  }

  pub fn list_crates(&self) -> Vec<&Package> {
    self.metadata.workspace_packages()
  }

  pub fn workspace_root(&self) -> &Path {
    self.metadata.workspace_root.as_std_path()
  }

  /// `[workspace.metadata.impact]` as a property source.
  pub fn properties(&self) -> ImpactResult<PropertySource> {
    PropertySource::from_json(
      "[workspace.metadata.impact] in Cargo.toml",
      self.metadata.workspace_metadata.get(METADATA_KEY),
    )
  }

  /// Translate workspace packages into modules.
  ///
  /// Normal and build dependencies become dependencies; dev-dependencies become
  /// test dependencies. Non-workspace dependencies are left for the graph to drop.
  pub fn modules(&self) -> ImpactResult<Vec<Module>> {
    let packages = self.list_crates();
    let members: HashSet<String> = packages.iter().map(|pkg| pkg.name.to_string()).collect();

    let mut modules = Vec::with_capacity(packages.len());
    for pkg in packages {
      let root = package_root(pkg)?;
      let mut dependencies = Vec::new();
      let mut test_dependencies = Vec::new();

      for dep in &pkg.dependencies {
        if !members.contains(&dep.name) {
          continue;
        }
        match dep.kind {
          DependencyKind::Development => test_dependencies.push(dep.name.clone()),
          _ => dependencies.push(dep.name.clone()),
        }
      }

      modules.push(
        Module::new(pkg.name.to_string(), root)
          .depends_on(dependencies)
          .test_depends_on(test_dependencies),
      );
    }
    Ok(modules)
  }
}

fn package_root(pkg: &Package) -> ImpactResult<PathBuf> {
  let manifest = pkg.manifest_path.as_std_path();
  let dir = manifest.parent().unwrap_or(manifest);
  dir
    .canonicalize()
    .with_context(|| format!("Failed to resolve package directory {}", dir.display()))
}
