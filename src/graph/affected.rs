//! Affected module analysis
//!
//! Pipeline from git state to a build plan:
//!
//! ```text
//! ChangeResolver   git → ChangeSet (repo-relative paths)
//! PathMapper       paths → directly-changed module ids
//! ignored-projects drop matching ids from the direct set
//! propagate        direct ids → ImpactedSet
//! BuildPlan        ImpactedSet → build / tests skipped / excluded
//! ```
//!
//! With `enabled=false` git is never touched and every module is built with tests.

use super::impact::{ImpactedSet, PropagationMode, propagate};
use super::mapper::PathMapper;
use super::module_graph::ModuleGraph;
use crate::core::changes::{ChangeResolver, ChangeSet};
use crate::core::config::{ImpactConfig, Property};
use crate::core::context::WorkspaceContext;
use crate::core::error::ImpactResult;
use crate::core::patterns::PatternSet;
use crate::core::plan::BuildPlan;
use crate::core::vcs::SystemGit;
use std::collections::BTreeSet;
use std::path::Path;

/// Complete affected analysis.
#[derive(Debug, Clone)]
pub struct AffectedAnalysis {
  /// Files that changed (empty when the engine is disabled)
  pub changes: ChangeSet,

  /// Modules owning changed files, after ignored projects are dropped
  pub directly_changed: BTreeSet<String>,

  /// Impact set
  pub impacted: ImpactedSet,

  /// Final plan
  pub plan: BuildPlan,

  /// False when `enabled=false` short-circuited the analysis
  pub enabled: bool,
}

/// Run the full pipeline for a workspace and persist the plan when configured.
pub fn analyze(ctx: &WorkspaceContext, also_make: bool) -> ImpactResult<AffectedAnalysis> {
  let config = ctx.config.as_ref();

  if !config.enabled {
    tracing::info!("impact analysis disabled; building every module");
    let mode = PropagationMode {
      build_all: true,
      also_make_dependencies: false,
    };
    let impacted = propagate(&ctx.graph, &BTreeSet::new(), mode);
    let plan = BuildPlan::generate(&ctx.graph, &impacted, false, &ctx.root);
    return Ok(AffectedAnalysis {
      changes: ChangeSet::default(),
      directly_changed: BTreeSet::new(),
      impacted,
      plan,
      enabled: false,
    });
  }

  let ignored_projects = PatternSet::new(Property::IgnoredProjects, &config.ignored_projects)?;

  let git = SystemGit::open(&ctx.root)?;
  let changes = ChangeResolver::new(&git, config).resolve()?;

  let analysis = analyze_changes(
    &ctx.graph,
    config,
    &ignored_projects,
    changes,
    git.work_tree(),
    &ctx.root,
    also_make,
  );
  analysis.plan.persist(config);
  Ok(analysis)
}

/// Map, filter, propagate and plan an already-resolved change set.
pub fn analyze_changes(
  graph: &ModuleGraph,
  config: &ImpactConfig,
  ignored_projects: &PatternSet,
  changes: ChangeSet,
  work_tree: &Path,
  root: &Path,
  also_make: bool,
) -> AffectedAnalysis {
  let mapper = PathMapper::new(graph.modules());
  let absolute = changes.absolute(work_tree);

  let mut directly_changed = mapper.changed_modules(&absolute);
  directly_changed.retain(|id| {
    let ignored = ignored_projects.matches(id);
    if ignored {
      tracing::debug!(module = %id, "ignoring changes in ignored project");
    }
    !ignored
  });
  tracing::debug!(files = changes.len(), modules = directly_changed.len(), "directly changed modules");

  let mode = PropagationMode {
    build_all: config.build_all,
    also_make_dependencies: also_make,
  };
  let impacted = propagate(graph, &directly_changed, mode);
  let plan = BuildPlan::generate(graph, &impacted, config.skip_tests_for_not_impacted_modules, root);

  AffectedAnalysis {
    changes,
    directly_changed,
    impacted,
    plan,
    enabled: true,
  }
}
