//! Integration tests for cargo-impact
//!
//! Each test drives the built binary against a temporary git repository.

mod helpers;
mod test_git;
mod test_plan;
