//! Property table and layered configuration for cargo-impact
//!
//! Properties form a closed table: every source (project metadata, config file,
//! environment, command line) is checked by exact name against it, and an
//! unknown name is a configuration error that lists the allowed names.
//!
//! Precedence, lowest to highest:
//!
//! 1. built-in defaults
//! 2. project properties (`[workspace.metadata.impact]` or the JSON model's `properties`)
//! 3. config file (impact.toml, .impact.toml, .cargo/impact.toml, .config/impact.toml)
//! 4. `IMPACT_*` environment variables
//! 5. `--set name=value` on the command line

use crate::core::error::{ConfigError, ImpactError, ImpactResult, ResultExt};
use crate::core::patterns::PatternSet;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable prefix for properties
pub const ENV_PREFIX: &str = "IMPACT_";

/// Every property cargo-impact understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
  Enabled,
  RepositorySshKey,
  ReferenceBranch,
  BaseBranch,
  Uncommitted,
  Untracked,
  SkipTestsForNotImpactedModules,
  BuildAll,
  CompareToMergeBase,
  FetchBaseBranch,
  FetchReferenceBranch,
  OutputFile,
  WriteChanged,
  IgnoreChanged,
  IgnoredProjects,
}

impl Property {
  pub const ALL: [Property; 15] = [
    Property::Enabled,
    Property::RepositorySshKey,
    Property::ReferenceBranch,
    Property::BaseBranch,
    Property::Uncommitted,
    Property::Untracked,
    Property::SkipTestsForNotImpactedModules,
    Property::BuildAll,
    Property::CompareToMergeBase,
    Property::FetchBaseBranch,
    Property::FetchReferenceBranch,
    Property::OutputFile,
    Property::WriteChanged,
    Property::IgnoreChanged,
    Property::IgnoredProjects,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Property::Enabled => "enabled",
      Property::RepositorySshKey => "repository-ssh-key",
      Property::ReferenceBranch => "reference-branch",
      Property::BaseBranch => "base-branch",
      Property::Uncommitted => "uncommitted",
      Property::Untracked => "untracked",
      Property::SkipTestsForNotImpactedModules => "skip-tests-for-not-impacted-modules",
      Property::BuildAll => "build-all",
      Property::CompareToMergeBase => "compare-to-merge-base",
      Property::FetchBaseBranch => "fetch-base-branch",
      Property::FetchReferenceBranch => "fetch-reference-branch",
      Property::OutputFile => "output-file",
      Property::WriteChanged => "write-changed",
      Property::IgnoreChanged => "ignore-changed",
      Property::IgnoredProjects => "ignored-projects",
    }
  }

  pub fn default_value(self) -> &'static str {
    match self {
      Property::Enabled => "true",
      Property::RepositorySshKey => "",
      Property::ReferenceBranch => "refs/remotes/origin/main",
      Property::BaseBranch => "HEAD",
      Property::Uncommitted => "true",
      Property::Untracked => "true",
      Property::SkipTestsForNotImpactedModules => "false",
      Property::BuildAll => "false",
      Property::CompareToMergeBase => "true",
      Property::FetchBaseBranch => "false",
      Property::FetchReferenceBranch => "false",
      Property::OutputFile => "",
      Property::WriteChanged => "true",
      Property::IgnoreChanged => "",
      Property::IgnoredProjects => "",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      Property::Enabled => "Plan from git changes; when false every module is built and tested",
      Property::RepositorySshKey => "Private key used for authenticated fetches",
      Property::ReferenceBranch => "Branch the current state is compared against",
      Property::BaseBranch => "Branch (or HEAD) holding the changes",
      Property::Uncommitted => "Include uncommitted changes to tracked files",
      Property::Untracked => "Include untracked files",
      Property::SkipTestsForNotImpactedModules => "Skip tests of modules built only as upstream dependencies",
      Property::BuildAll => "Build every module regardless of changes",
      Property::CompareToMergeBase => "Diff against the merge-base instead of the reference tip",
      Property::FetchBaseBranch => "Fetch the base branch before diffing",
      Property::FetchReferenceBranch => "Fetch the reference branch before diffing",
      Property::OutputFile => "File receiving the built (or skipped) module paths",
      Property::WriteChanged => "Write built modules (true) or skipped modules (false)",
      Property::IgnoreChanged => "Changed-path patterns to ignore (globs, or regex:<expr>)",
      Property::IgnoredProjects => "Module id patterns never treated as changed",
    }
  }

  /// Exact lookup by property name.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|p| p.name() == name)
  }

  /// Environment variable carrying this property (e.g. `IMPACT_BUILD_ALL`)
  pub fn env_var(self) -> String {
    format!("{}{}", ENV_PREFIX, self.name().to_uppercase().replace('-', "_"))
  }

  fn allowed_names() -> Vec<String> {
    Self::ALL.iter().map(|p| p.name().to_string()).collect()
  }
}

/// A raw property value as written in its source.
///
/// Arrays from TOML or JSON stay lists; their items are never re-split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
  Text(String),
  List(Vec<String>),
}

impl PropertyValue {
  /// Single-line rendering for display and flag parsing.
  pub fn as_text(&self) -> String {
    match self {
      PropertyValue::Text(text) => text.clone(),
      PropertyValue::List(items) => items.join(", "),
    }
  }

  /// Pattern entries: list items as written, text split on commas and newlines.
  pub fn items(&self) -> Vec<String> {
    match self {
      PropertyValue::Text(text) => split_patterns(text),
      PropertyValue::List(items) => items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect(),
    }
  }
}

impl From<&str> for PropertyValue {
  fn from(text: &str) -> Self {
    PropertyValue::Text(text.to_string())
  }
}

impl From<String> for PropertyValue {
  fn from(text: String) -> Self {
    PropertyValue::Text(text)
  }
}

/// One layer of raw `name = value` pairs with a label for error messages.
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
  pub label: String,
  pub entries: Vec<(String, PropertyValue)>,
}

impl PropertySource {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      entries: Vec::new(),
    }
  }

  /// Build a source from a JSON object (cargo workspace metadata, JSON project model).
  ///
  /// A missing or null table yields an empty source.
  pub fn from_json(label: impl Into<String>, table: Option<&serde_json::Value>) -> ImpactResult<Self> {
    let mut source = Self::new(label);
    let Some(table) = table else {
      return Ok(source);
    };
    if table.is_null() {
      return Ok(source);
    }

    let object = table.as_object().ok_or_else(|| {
      ImpactError::message(format!("{} must be a table of property values", source.label))
    })?;

    for (name, value) in object {
      let value = json_value(name, value)?;
      source.entries.push((name.clone(), value));
    }
    Ok(source)
  }

  /// Find the config file in search order: impact.toml, .impact.toml, .cargo/impact.toml, .config/impact.toml
  pub fn find_config_path(root: &Path) -> Option<PathBuf> {
    let candidates = vec![
      root.join("impact.toml"),
      root.join(".impact.toml"),
      root.join(".cargo").join("impact.toml"),
      root.join(".config").join("impact.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load the config file layer, if one exists.
  pub fn from_config_file(root: &Path) -> ImpactResult<Option<Self>> {
    let Some(path) = Self::find_config_path(root) else {
      return Ok(None);
    };

    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let doc: toml_edit::DocumentMut = content
      .parse()
      .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    let mut source = Self::new(path.display().to_string());
    for (name, item) in doc.as_table().iter() {
      let value = item.as_value().ok_or_else(|| ConfigError::InvalidValue {
        name: name.to_string(),
        value: item.to_string().trim().to_string(),
        expected: "a string, boolean or array".to_string(),
      })?;
      source.entries.push((name.to_string(), toml_value(name, value)?));
    }
    Ok(Some(source))
  }

  /// Collect `IMPACT_*` variables from the process environment.
  pub fn from_env() -> ImpactResult<Self> {
    Self::from_env_vars(std::env::vars())
  }

  /// Collect `IMPACT_*` variables from the given pairs.
  pub fn from_env_vars(vars: impl IntoIterator<Item = (String, String)>) -> ImpactResult<Self> {
    let mut source = Self::new("environment");
    for (key, value) in vars {
      if !key.starts_with(ENV_PREFIX) {
        continue;
      }
      let property = Property::ALL.into_iter().find(|p| p.env_var() == key).ok_or_else(|| {
        ConfigError::UnknownEnvVar {
          name: key.clone(),
          allowed: Property::ALL.iter().map(|p| p.env_var()).collect(),
        }
      })?;
      source.entries.push((property.name().to_string(), value.into()));
    }
    Ok(source)
  }

  /// Parse `name=value` command line overrides.
  pub fn from_overrides(overrides: &[String]) -> ImpactResult<Self> {
    let mut source = Self::new("command line");
    for raw in overrides {
      let (name, value) = raw.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
        name: raw.clone(),
        value: String::new(),
        expected: "name=value".to_string(),
      })?;
      source.entries.push((name.trim().to_string(), value.into()));
    }
    Ok(source)
  }
}

fn json_value(name: &str, value: &serde_json::Value) -> ImpactResult<PropertyValue> {
  match value {
    serde_json::Value::Array(items) => {
      let items: ImpactResult<Vec<String>> = items.iter().map(|item| json_scalar(name, item)).collect();
      Ok(PropertyValue::List(items?))
    }
    scalar => Ok(PropertyValue::Text(json_scalar(name, scalar)?)),
  }
}

fn json_scalar(name: &str, value: &serde_json::Value) -> ImpactResult<String> {
  use serde_json::Value;
  match value {
    Value::String(s) => Ok(s.clone()),
    Value::Bool(b) => Ok(b.to_string()),
    Value::Number(n) => Ok(n.to_string()),
    other => Err(
      ConfigError::InvalidValue {
        name: name.to_string(),
        value: other.to_string(),
        expected: "a string, boolean or array".to_string(),
      }
      .into(),
    ),
  }
}

fn toml_value(name: &str, value: &toml_edit::Value) -> ImpactResult<PropertyValue> {
  if let Some(array) = value.as_array() {
    let items: ImpactResult<Vec<String>> = array.iter().map(|item| toml_scalar(name, item)).collect();
    return Ok(PropertyValue::List(items?));
  }
  Ok(PropertyValue::Text(toml_scalar(name, value)?))
}

fn toml_scalar(name: &str, value: &toml_edit::Value) -> ImpactResult<String> {
  if let Some(s) = value.as_str() {
    return Ok(s.to_string());
  }
  if let Some(b) = value.as_bool() {
    return Ok(b.to_string());
  }
  if let Some(i) = value.as_integer() {
    return Ok(i.to_string());
  }
  Err(
    ConfigError::InvalidValue {
      name: name.to_string(),
      value: value.to_string().trim().to_string(),
      expected: "a string, boolean or array".to_string(),
    }
    .into(),
  )
}

/// Resolved property values after layering every source over the defaults.
#[derive(Debug, Clone)]
pub struct Properties {
  values: BTreeMap<Property, String>,
  lists: BTreeMap<Property, Vec<String>>,
}

impl Properties {
  /// Layer sources in order; later sources win.
  pub fn resolve(sources: &[PropertySource]) -> ImpactResult<Self> {
    let mut values: BTreeMap<Property, String> = Property::ALL
      .iter()
      .map(|p| (*p, p.default_value().to_string()))
      .collect();

    let mut lists = BTreeMap::new();

    for source in sources {
      for (name, value) in &source.entries {
        let property = Property::from_name(name).ok_or_else(|| ConfigError::UnknownProperty {
          name: name.clone(),
          source: source.label.clone(),
          allowed: Property::allowed_names(),
        })?;
        values.insert(property, value.as_text());
        match value {
          PropertyValue::List(_) => lists.insert(property, value.items()),
          PropertyValue::Text(_) => lists.remove(&property),
        };
      }
    }

    Ok(Self { values, lists })
  }

  pub fn get(&self, property: Property) -> &str {
    self.values.get(&property).map(String::as_str).unwrap_or_default()
  }

  fn flag(&self, property: Property) -> ImpactResult<bool> {
    let raw = self.get(property).trim();
    if raw.eq_ignore_ascii_case("true") {
      Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
      Ok(false)
    } else {
      Err(
        ConfigError::InvalidValue {
          name: property.name().to_string(),
          value: raw.to_string(),
          expected: "true or false".to_string(),
        }
        .into(),
      )
    }
  }

  /// Pattern list for a property; arrays keep their items intact.
  pub fn list(&self, property: Property) -> Vec<String> {
    match self.lists.get(&property) {
      Some(items) => items.clone(),
      None => split_patterns(self.get(property)),
    }
  }

  fn non_empty(&self, property: Property) -> Option<&str> {
    let raw = self.get(property).trim();
    if raw.is_empty() { None } else { Some(raw) }
  }
}

/// Split a pattern list on commas and newlines, dropping blanks.
pub fn split_patterns(raw: &str) -> Vec<String> {
  raw
    .split([',', '\n'])
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

/// Typed configuration, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct ImpactConfig {
  pub enabled: bool,
  pub ssh_key: Option<PathBuf>,
  pub reference_branch: String,
  pub base_branch: String,
  pub uncommitted: bool,
  pub untracked: bool,
  pub skip_tests_for_not_impacted_modules: bool,
  pub build_all: bool,
  pub compare_to_merge_base: bool,
  pub fetch_base_branch: bool,
  pub fetch_reference_branch: bool,
  pub output_file: Option<PathBuf>,
  pub write_changed: bool,
  pub ignore_changed: Vec<String>,
  pub ignored_projects: Vec<String>,
}

impl ImpactConfig {
  /// Resolve every layer for a workspace root without interpreting values.
  ///
  /// `project` carries the host's own properties; `overrides` are raw
  /// `name=value` strings from the command line.
  pub fn layered_properties(root: &Path, project: PropertySource, overrides: &[String]) -> ImpactResult<Properties> {
    let mut sources = vec![project];
    if let Some(file) = PropertySource::from_config_file(root)? {
      sources.push(file);
    }
    sources.push(PropertySource::from_env()?);
    sources.push(PropertySource::from_overrides(overrides)?);
    Properties::resolve(&sources)
  }

  /// Interpret resolved properties; relative paths resolve against `root`.
  pub fn from_properties(properties: &Properties, root: &Path) -> ImpactResult<Self> {
    let ssh_key = match properties.non_empty(Property::RepositorySshKey) {
      Some(raw) => {
        let key = root.join(raw).canonicalize().map_err(|_| ConfigError::InvalidValue {
          name: Property::RepositorySshKey.name().to_string(),
          value: raw.to_string(),
          expected: "an existing key file".to_string(),
        })?;
        Some(key)
      }
      None => None,
    };

    let reference_branch = properties
      .non_empty(Property::ReferenceBranch)
      .ok_or_else(|| ConfigError::InvalidValue {
        name: Property::ReferenceBranch.name().to_string(),
        value: String::new(),
        expected: "a branch name".to_string(),
      })?
      .to_string();

    let base_branch = properties.non_empty(Property::BaseBranch).unwrap_or("HEAD").to_string();

    let ignore_changed = properties.list(Property::IgnoreChanged);
    let ignored_projects = properties.list(Property::IgnoredProjects);
    // Malformed patterns are configuration errors, raised before any git access
    PatternSet::new(Property::IgnoreChanged, &ignore_changed)?;
    PatternSet::new(Property::IgnoredProjects, &ignored_projects)?;

    Ok(Self {
      enabled: properties.flag(Property::Enabled)?,
      ssh_key,
      reference_branch,
      base_branch,
      uncommitted: properties.flag(Property::Uncommitted)?,
      untracked: properties.flag(Property::Untracked)?,
      skip_tests_for_not_impacted_modules: properties.flag(Property::SkipTestsForNotImpactedModules)?,
      build_all: properties.flag(Property::BuildAll)?,
      compare_to_merge_base: properties.flag(Property::CompareToMergeBase)?,
      fetch_base_branch: properties.flag(Property::FetchBaseBranch)?,
      fetch_reference_branch: properties.flag(Property::FetchReferenceBranch)?,
      output_file: properties.non_empty(Property::OutputFile).map(|raw| root.join(raw)),
      write_changed: properties.flag(Property::WriteChanged)?,
      ignore_changed,
      ignored_projects,
    })
  }
}
