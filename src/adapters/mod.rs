//! Project model adapters
//!
//! An adapter translates a host project description into plain `Module` values
//! plus the host's own property table, once, at startup. The engine never holds
//! host objects.
//!
//! Currently supports:
//! - Rust (Cargo workspaces, via cargo metadata)
//! - JSON project model files (`--model <file>`)

use crate::core::config::PropertySource;
use crate::core::error::{ImpactError, ImpactResult};
use crate::graph::module::Module;
use std::path::{Path, PathBuf};

pub mod cargo;
pub mod model;

/// Host-neutral project description
#[derive(Debug, Clone)]
pub struct ProjectModel {
  /// Project root directory (absolute)
  pub root: PathBuf,
  /// Every module of the project
  pub modules: Vec<Module>,
  /// Properties declared by the project itself
  pub properties: PropertySource,
  /// Whether modules are Cargo packages (required by `cargo impact test`)
  pub is_cargo: bool,
}

/// Project adapter trait
///
/// Each host (Cargo, JSON model) implements this trait to provide module
/// discovery and its own property layer.
pub trait ProjectAdapter {
  /// Detect if this adapter can handle the given directory
  fn can_handle(&self, root: &Path) -> bool;

  /// Load the project model
  fn load(&self, root: &Path) -> ImpactResult<ProjectModel>;

  /// Human-readable adapter name
  fn name(&self) -> &str;
}

/// Detect the appropriate adapter
///
/// An explicit model file wins; otherwise Cargo is tried.
pub fn detect_adapter(root: &Path, model: Option<&Path>) -> ImpactResult<Box<dyn ProjectAdapter>> {
  if let Some(path) = model {
    return Ok(Box::new(model::ModelAdapter::new(root.join(path))));
  }

  let cargo_adapter = cargo::CargoAdapter::new();
  if cargo_adapter.can_handle(root) {
    return Ok(Box::new(cargo_adapter));
  }

  Err(ImpactError::with_help(
    format!("Could not detect a project at {}", root.display()),
    "Run inside a Cargo workspace, or pass --model <file> with a JSON project model",
  ))
}
