//! Core engine for cargo-impact
//!
//! - **changes**: Change source resolution (committed, uncommitted, untracked)
//! - **config**: Layered property resolution into a typed `ImpactConfig`
//! - **context**: Unified workspace context, built once in main
//! - **error**: Error types with contextual help messages and exit codes
//! - **patterns**: Glob/regex pattern lists for ignored paths and projects
//! - **plan**: Build plan generation and persistence
//! - **vcs**: Git operations abstraction (SystemGit)

pub mod changes;
pub mod config;
pub mod context;
pub mod error;
pub mod patterns;
pub mod plan;
pub mod vcs;
