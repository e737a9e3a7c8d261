//! Cargo/Rust project adapter

use super::{ProjectAdapter, ProjectModel};
use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::error::{ImpactResult, ResultExt};
use std::path::Path;

pub struct CargoAdapter;

impl CargoAdapter {
  pub fn new() -> Self {
    Self
  }
}

impl Default for CargoAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl ProjectAdapter for CargoAdapter {
  fn can_handle(&self, root: &Path) -> bool {
    // Any manifest at or above root; cargo resolves the enclosing workspace
    root.ancestors().any(|dir| dir.join("Cargo.toml").is_file())
  }

  fn load(&self, root: &Path) -> ImpactResult<ProjectModel> {
    let metadata = WorkspaceMetadata::load(root)?;
    let workspace_root = metadata
      .workspace_root()
      .canonicalize()
      .context("Failed to resolve workspace root")?;

    let modules = metadata.modules()?;
    tracing::debug!(root = %workspace_root.display(), modules = modules.len(), "loaded cargo workspace");

    Ok(ProjectModel {
      root: workspace_root,
      modules,
      properties: metadata.properties()?,
      is_cargo: true,
    })
  }

  fn name(&self) -> &str {
    "cargo"
  }
}
