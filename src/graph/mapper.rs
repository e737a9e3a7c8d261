//! Changed path → owning module mapping
//!
//! Each module root directory is indexed once; a path is attributed by walking
//! its ancestors upward, so the first hit is the longest matching root. Paths
//! are never touched on disk: deleted files map just like existing ones.

use super::module::Module;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub struct PathMapper {
  /// Module root directory → module id
  roots: HashMap<PathBuf, String>,
}

impl PathMapper {
  pub fn new<'a>(modules: impl IntoIterator<Item = &'a Module>) -> Self {
    let mut roots = HashMap::new();
    for module in modules {
      roots.entry(module.root.clone()).or_insert_with(|| module.id.clone());
    }
    Self { roots }
  }

  /// Owning module of an absolute path, if any.
  pub fn module_for(&self, path: &Path) -> Option<&str> {
    path
      .ancestors()
      .find_map(|ancestor| self.roots.get(ancestor))
      .map(String::as_str)
  }

  /// Path → module id for every path that lies inside a module.
  pub fn map_paths<'p>(&self, paths: impl IntoIterator<Item = &'p PathBuf>) -> BTreeMap<PathBuf, String> {
    paths
      .into_iter()
      .filter_map(|path| match self.module_for(path) {
        Some(id) => Some((path.clone(), id.to_string())),
        None => {
          tracing::debug!(path = %path.display(), "changed path outside every module");
          None
        }
      })
      .collect()
  }

  /// Ids of modules owning at least one of the paths.
  pub fn changed_modules<'p>(&self, paths: impl IntoIterator<Item = &'p PathBuf>) -> BTreeSet<String> {
    self.map_paths(paths).into_values().collect()
  }
}
