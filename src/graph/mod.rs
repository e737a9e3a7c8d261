//! Graph-aware impact analysis
//!
//! Built on petgraph over plain `Module` values translated once from the host model.

pub mod affected;
pub mod impact;
pub mod mapper;
pub mod module;
pub mod module_graph;

pub use affected::AffectedAnalysis;
