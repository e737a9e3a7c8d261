//! Unified workspace context - build once, pass everywhere
//!
//! # Architecture
//!
//! ```text
//! main.rs:
//!   WorkspaceContext::build() -> &WorkspaceContext
//!   |
//!   v
//! commands/plan.rs, test.rs, properties.rs:
//!   fn run_*(ctx: &WorkspaceContext, ...)
//! ```
//!
//! Everything here is resolved before any git access: configuration errors
//! surface first.

use crate::adapters::{ProjectModel, detect_adapter};
use crate::core::config::{ImpactConfig, Properties};
use crate::core::error::ImpactResult;
use crate::graph::module_graph::ModuleGraph;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unified workspace context containing all shared workspace-level data.
///
/// Uses Arc for sharing the graph without expensive clones.
#[derive(Clone)]
pub struct WorkspaceContext {
  /// Project root directory (absolute)
  pub root: PathBuf,

  /// Whether modules are Cargo packages
  pub is_cargo: bool,

  /// Layered raw property values
  pub properties: Properties,

  /// Typed configuration
  pub config: Arc<ImpactConfig>,

  /// Module dependency graph
  pub graph: Arc<ModuleGraph>,
}

impl WorkspaceContext {
  /// Build workspace context from the invocation directory.
  ///
  /// `model` selects a JSON project model instead of cargo metadata;
  /// `overrides` are raw `name=value` strings from the command line.
  pub fn build(cwd: &Path, model: Option<&Path>, overrides: &[String]) -> ImpactResult<Self> {
    let adapter = detect_adapter(cwd, model)?;
    let ProjectModel {
      root,
      modules,
      properties: project_properties,
      is_cargo,
    } = adapter.load(cwd)?;
    tracing::debug!(adapter = adapter.name(), root = %root.display(), "project loaded");

    let properties = ImpactConfig::layered_properties(&root, project_properties, overrides)?;
    let config = ImpactConfig::from_properties(&properties, &root)?;
    let graph = ModuleGraph::build(modules)?;
    tracing::debug!(modules = graph.len(), order = ?graph.build_order(), "module graph built");

    Ok(Self {
      root,
      is_cargo,
      properties,
      config: Arc::new(config),
      graph: Arc::new(graph),
    })
  }

  /// Get workspace root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
