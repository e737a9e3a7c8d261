//! Impact propagation over the module graph
//!
//! Algorithm:
//! 1. Seed with directly-changed modules (`DirectlyChanged`)
//! 2. Add the transitive dependents closure (`DownstreamOfChanged`); their
//!    compiled output may reference changed code
//! 3. With also-make, add the transitive dependencies of everything impacted
//!    (`UpstreamDependency`) so their artifacts exist for the build
//!
//! `build_all` short-circuits to every module. An empty seed without
//! `build_all` yields an empty set: nothing to build.

use super::module_graph::ModuleGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Why a module is part of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Reason {
  DirectlyChanged,
  DownstreamOfChanged,
  UpstreamDependency,
}

/// Mode flags for propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationMode {
  /// Build every module regardless of changes
  pub build_all: bool,
  /// Also make dependencies of impacted modules (make-upstream)
  pub also_make_dependencies: bool,
}

/// Modules requiring a rebuild, each tagged with one or more reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactedSet {
  entries: BTreeMap<String, BTreeSet<Reason>>,
}

impl ImpactedSet {
  pub fn reasons(&self, id: &str) -> Option<&BTreeSet<Reason>> {
    self.entries.get(id)
  }

  /// Impacted ids, sorted.
  pub fn ids(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  /// Ids carrying the given reason, sorted.
  pub fn with_reason(&self, reason: Reason) -> Vec<&str> {
    self
      .entries
      .iter()
      .filter(|(_, reasons)| reasons.contains(&reason))
      .map(|(id, _)| id.as_str())
      .collect()
  }

  /// True when `upstream dependency` is the only reason for this module.
  pub fn is_upstream_only(&self, id: &str) -> bool {
    self
      .entries
      .get(id)
      .is_some_and(|reasons| reasons.len() == 1 && reasons.contains(&Reason::UpstreamDependency))
  }

  fn tag(&mut self, id: &str, reason: Reason) {
    self.entries.entry(id.to_string()).or_default().insert(reason);
  }
}

/// Compute the impacted set from the directly-changed modules.
///
/// Ids unknown to the graph are ignored.
pub fn propagate(graph: &ModuleGraph, directly_changed: &BTreeSet<String>, mode: PropagationMode) -> ImpactedSet {
  let mut impacted = ImpactedSet::default();

  let direct: Vec<&str> = directly_changed
    .iter()
    .map(String::as_str)
    .filter(|id| {
      let known = graph.contains(id);
      if !known {
        tracing::debug!(module = %id, "ignoring change in unknown module");
      }
      known
    })
    .collect();

  if mode.build_all {
    for module in graph.modules() {
      let reason = if directly_changed.contains(&module.id) {
        Reason::DirectlyChanged
      } else {
        Reason::DownstreamOfChanged
      };
      impacted.tag(&module.id, reason);
    }
    return impacted;
  }

  if direct.is_empty() {
    return impacted;
  }

  for id in &direct {
    impacted.tag(id, Reason::DirectlyChanged);
  }

  let downstream = graph.transitive_dependents(direct.iter().copied());
  for id in &downstream {
    impacted.tag(id, Reason::DownstreamOfChanged);
  }
  tracing::debug!(direct = direct.len(), downstream = downstream.len(), "downstream closure");

  if mode.also_make_dependencies {
    let seeds: Vec<String> = impacted.ids().map(String::from).collect();
    let upstream = graph.transitive_dependencies(seeds.iter().map(String::as_str));
    for id in &upstream {
      impacted.tag(id, Reason::UpstreamDependency);
    }
    tracing::debug!(upstream = upstream.len(), "upstream closure");
  }

  impacted
}
