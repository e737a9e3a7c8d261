//! Module dependency graph built on petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A depends on B"
//! - **Nodes**: Modules (the known module set only; external artifacts are dropped)
//! - **Edges**: `Requires` (declared dependency), `Parent` (child → parent),
//!   `Test` (test-only dependency)
//! - **Build order**: toposort over `Requires`/`Parent` edges, dependencies first
//!
//! Test edges are followed by impact traversal but ignored for ordering and cycle
//! detection: Cargo allows dev-dependency cycles, build cycles are fatal.

use super::module::Module;
use crate::core::error::{ConfigError, GraphError, ImpactResult};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
  Requires,
  Parent,
  Test,
}

impl EdgeKind {
  fn orders_build(self) -> bool {
    !matches!(self, EdgeKind::Test)
  }
}

/// Dependency graph over every known module.
pub struct ModuleGraph {
  graph: DiGraph<Module, EdgeKind>,

  /// Index: module id → node index
  id_to_node: HashMap<String, NodeIndex>,

  /// Topological build order (dependencies first)
  build_order: Vec<NodeIndex>,
}

impl ModuleGraph {
  /// Build the graph from the full module list.
  ///
  /// # Errors
  /// - `ConfigError::DuplicateModule` when two modules share an id
  /// - `GraphError::Cycle` when `Requires`/`Parent` edges form a cycle
  pub fn build(modules: Vec<Module>) -> ImpactResult<Self> {
    let mut modules = modules;
    // Insertion order drives toposort tie-breaking; sort for determinism
    modules.sort_by(|a, b| a.id.cmp(&b.id));

    let mut graph = DiGraph::with_capacity(modules.len(), modules.len());
    let mut id_to_node = HashMap::new();

    for module in modules {
      let id = module.id.clone();
      if id_to_node.contains_key(&id) {
        return Err(ConfigError::DuplicateModule { id }.into());
      }
      let idx = graph.add_node(module);
      id_to_node.insert(id, idx);
    }

    let mut edges = Vec::new();
    for from in graph.node_indices() {
      let module = &graph[from];
      let declared = module
        .dependencies
        .iter()
        .map(|dep| (dep, EdgeKind::Requires))
        .chain(
          module
            .test_dependencies
            .iter()
            .filter(|dep| !module.dependencies.contains(*dep))
            .map(|dep| (dep, EdgeKind::Test)),
        )
        .chain(module.parent.iter().map(|parent| (parent, EdgeKind::Parent)));

      for (target, kind) in declared {
        // Unknown ids are external artifacts
        match id_to_node.get(target) {
          Some(to) => edges.push((from, *to, kind)),
          None => tracing::trace!(module = %module.id, dependency = %target, "ignoring external dependency"),
        }
      }
    }
    for (from, to, kind) in edges {
      graph.update_edge(from, to, kind);
    }

    let build_order = Self::compute_build_order(&graph)?;

    Ok(Self {
      graph,
      id_to_node,
      build_order,
    })
  }

  fn compute_build_order(graph: &DiGraph<Module, EdgeKind>) -> ImpactResult<Vec<NodeIndex>> {
    // Same node indices, ordering edges only
    let ordering = graph.filter_map(
      |_, _| Some(()),
      |_, kind| if kind.orders_build() { Some(()) } else { None },
    );

    match algo::toposort(&ordering, None) {
      Ok(mut order) => {
        // toposort puts dependents first
        order.reverse();
        Ok(order)
      }
      Err(cycle) => {
        let start = cycle.node_id();
        let component = algo::tarjan_scc(&ordering)
          .into_iter()
          .find(|component| component.contains(&start))
          .unwrap_or_else(|| vec![start]);

        let mut modules: Vec<String> = component.into_iter().map(|idx| graph[idx].id.clone()).collect();
        modules.sort();
        Err(GraphError::Cycle { modules }.into())
      }
    }
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn contains(&self, id: &str) -> bool {
    self.id_to_node.contains_key(id)
  }

  /// Modules in build order (dependencies before dependents).
  pub fn modules(&self) -> impl Iterator<Item = &Module> {
    self.build_order.iter().map(|idx| &self.graph[*idx])
  }

  /// Module ids in build order.
  pub fn build_order(&self) -> Vec<&str> {
    self.modules().map(|m| m.id.as_str()).collect()
  }

  /// Direct dependencies of a module (what it uses).
  pub fn dependencies(&self, id: &str) -> Vec<&str> {
    self.neighbors(id, Direction::Outgoing)
  }

  /// Direct dependents of a module (what uses it).
  pub fn dependents(&self, id: &str) -> Vec<&str> {
    self.neighbors(id, Direction::Incoming)
  }

  fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
    let Some(idx) = self.id_to_node.get(id) else {
      return vec![];
    };

    let mut ids: Vec<&str> = self
      .graph
      .neighbors_directed(*idx, direction)
      .map(|n| self.graph[n].id.as_str())
      .collect();
    ids.sort();
    ids.dedup();
    ids
  }

  /// Every module reachable from `seeds` via dependent edges, excluding the seeds.
  pub fn transitive_dependents<'a>(&'a self, seeds: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    self.closure(seeds, Direction::Incoming)
  }

  /// Every module reachable from `seeds` via dependency edges, excluding the seeds.
  pub fn transitive_dependencies<'a>(&'a self, seeds: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    self.closure(seeds, Direction::Outgoing)
  }

  /// Breadth-first reachability closure; each module is visited at most once.
  fn closure<'a>(&'a self, seeds: impl IntoIterator<Item = &'a str>, direction: Direction) -> Vec<&'a str> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for seed in seeds {
      if let Some(idx) = self.id_to_node.get(seed)
        && visited.insert(*idx)
      {
        queue.push_back(*idx);
      }
    }

    let mut reached = Vec::new();
    while let Some(current) = queue.pop_front() {
      for neighbor in self.graph.neighbors_directed(current, direction) {
        if visited.insert(neighbor) {
          reached.push(self.graph[neighbor].id.as_str());
          queue.push_back(neighbor);
        }
      }
    }

    reached
  }
}
