//! Cargo workspace integration
//!
//! - **metadata**: Load workspace members and `[workspace.metadata.impact]` using cargo_metadata

pub mod metadata;
