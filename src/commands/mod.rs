//! CLI commands for cargo-impact
//!
//! - **plan**: Show which modules to build/test for the current changes
//! - **test**: Run cargo test/build for the planned modules
//! - **properties**: List every property with its effective value
//!
//! All commands accept `&WorkspaceContext` to avoid redundant workspace loads.

pub mod plan;
pub mod properties;

pub use plan::run_plan;
pub use properties::run_properties;
pub use test::run_test;
