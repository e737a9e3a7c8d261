//! JSON project model adapter
//!
//! ```json
//! {
//!   "properties": { "reference-branch": "refs/remotes/origin/main" },
//!   "modules": [
//!     { "id": "app", "path": "app", "dependencies": ["core"], "testDependencies": [], "parent": "root" }
//!   ]
//! }
//! ```
//!
//! Module paths are relative to the model file's directory, which is also the
//! project root.

use super::{ProjectAdapter, ProjectModel};
use crate::core::config::PropertySource;
use crate::core::error::{ConfigError, ImpactResult};
use crate::graph::module::Module;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelFile {
  #[serde(default)]
  properties: Option<serde_json::Value>,
  #[serde(default)]
  modules: Vec<ModelModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ModelModule {
  id: String,
  path: String,
  #[serde(default)]
  dependencies: Vec<String>,
  #[serde(default)]
  test_dependencies: Vec<String>,
  #[serde(default)]
  parent: Option<String>,
}

pub struct ModelAdapter {
  path: PathBuf,
}

impl ModelAdapter {
  pub fn new(path: PathBuf) -> Self {
    Self { path }
  }

  fn invalid(&self, reason: impl Into<String>) -> ConfigError {
    ConfigError::ModelInvalid {
      path: self.path.clone(),
      reason: reason.into(),
    }
  }
}

impl ProjectAdapter for ModelAdapter {
  fn can_handle(&self, _root: &Path) -> bool {
    self.path.is_file()
  }

  fn load(&self, _root: &Path) -> ImpactResult<ProjectModel> {
    let content = std::fs::read_to_string(&self.path).map_err(|e| self.invalid(e.to_string()))?;
    let file: ModelFile = serde_json::from_str(&content).map_err(|e| self.invalid(e.to_string()))?;

    let model_dir = self.path.parent().unwrap_or(Path::new("."));
    let root = model_dir
      .canonicalize()
      .map_err(|e| self.invalid(format!("cannot resolve model directory: {}", e)))?;

    let mut modules = Vec::with_capacity(file.modules.len());
    let mut owners: HashMap<PathBuf, String> = HashMap::new();
    for entry in file.modules {
      let dir = root.join(&entry.path);
      let module_root = dir
        .canonicalize()
        .map_err(|_| self.invalid(format!("module '{}' path {} does not exist", entry.id, dir.display())))?;

      // A changed file maps to exactly one module
      if let Some(owner) = owners.get(&module_root) {
        return Err(
          self
            .invalid(format!(
              "modules '{}' and '{}' share the directory {}",
              owner,
              entry.id,
              module_root.display()
            ))
            .into(),
        );
      }
      owners.insert(module_root.clone(), entry.id.clone());

      let mut module = Module::new(entry.id, module_root)
        .depends_on(entry.dependencies)
        .test_depends_on(entry.test_dependencies);
      if let Some(parent) = entry.parent {
        module = module.with_parent(parent);
      }
      modules.push(module);
    }

    let label = format!("properties in {}", self.path.display());
    let properties = PropertySource::from_json(label, file.properties.as_ref())?;
    tracing::debug!(root = %root.display(), modules = modules.len(), "loaded project model");

    Ok(ProjectModel {
      root,
      modules,
      properties,
      is_cargo: false,
    })
  }

  fn name(&self) -> &str {
    "json model"
  }
}
