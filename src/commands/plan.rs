//! `cargo impact plan` - Show which modules to build and test
//!
//! Resolves changes from git and prints:
//! - Modules that directly contain changed files
//! - Downstream dependents and (with `--also-make`) upstream dependencies
//! - Which built modules skip tests, and which modules are excluded

use crate::core::context::WorkspaceContext;
use crate::core::error::{ImpactError, ImpactResult};
use crate::graph::AffectedAnalysis;
use crate::graph::impact::Reason;
use crate::utils::path_to_git_format;
use serde_json::json;

/// Output format for the plan command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  Json,
  Names,
}

impl OutputFormat {
  pub fn parse(s: &str) -> ImpactResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      _ => Err(ImpactError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names",
        s
      ))),
    }
  }
}

/// Run the plan command
pub fn run_plan(ctx: &WorkspaceContext, also_make: bool, format: String) -> ImpactResult<()> {
  let output_format = OutputFormat::parse(&format)?;
  let analysis = crate::graph::affected::analyze(ctx, also_make)?;

  match output_format {
    OutputFormat::Text => display_text(ctx, &analysis),
    OutputFormat::Json => display_json(ctx, &analysis)?,
    OutputFormat::Names => display_names(&analysis),
  }
  Ok(())
}

/// Display the plan in human-readable text format
pub(crate) fn display_text(ctx: &WorkspaceContext, analysis: &AffectedAnalysis) {
  println!("🎯 Build Plan {}", analysis.plan.id());
  println!("════════════════════════════════════════");
  println!();

  if !analysis.enabled {
    println!("Impact analysis disabled (enabled=false): building every module");
  } else {
    let config = &ctx.config;
    println!("Reference: {}", config.reference_branch);
    println!("Base:      {}", config.base_branch);
    println!(
      "Changed files: {} committed, {} uncommitted, {} untracked",
      analysis.changes.committed.len(),
      analysis.changes.uncommitted.len(),
      analysis.changes.untracked.len()
    );
    if !analysis.changes.is_empty() && analysis.changes.len() <= 20 {
      for file in analysis.changes.all() {
        println!("  {}", path_to_git_format(file));
      }
    }
  }
  println!();

  if analysis.plan.is_empty() {
    println!("✅ Nothing to build");
    return;
  }

  println!("Direct impact: {} modules", analysis.directly_changed.len());
  for id in &analysis.directly_changed {
    let users = ctx.graph.dependents(id);
    if users.is_empty() {
      println!("  📦 {}", id);
    } else {
      println!("  📦 {} (used by {})", id, users.join(", "));
    }
  }

  let downstream: Vec<&str> = analysis
    .impacted
    .with_reason(Reason::DownstreamOfChanged)
    .into_iter()
    .filter(|id| !analysis.directly_changed.contains(*id))
    .collect();
  if !downstream.is_empty() {
    println!("\nDownstream dependents: {} modules", downstream.len());
    for id in &downstream {
      println!("  ⬆  {}", id);
    }
  }

  let upstream = analysis.impacted.with_reason(Reason::UpstreamDependency);
  if !upstream.is_empty() {
    println!("\nUpstream dependencies: {} modules", upstream.len());
    for id in &upstream {
      println!("  ⬇  {}", id);
    }
  }

  println!("\n🎯 Build order: {} modules", analysis.plan.build.len());
  for module in &analysis.plan.build {
    let tests = if module.tests_skipped { " (tests skipped)" } else { "" };
    println!("  {} [{}]{}", module.id, module.path, tests);
    let needs = ctx.graph.dependencies(&module.id);
    if !needs.is_empty() {
      println!("      needs: {}", needs.join(", "));
    }
  }

  if !analysis.plan.excluded.is_empty() {
    println!("\nExcluded: {} modules", analysis.plan.excluded.len());
  }
}

/// Display the plan in JSON format
fn display_json(ctx: &WorkspaceContext, analysis: &AffectedAnalysis) -> ImpactResult<()> {
  let paths = |set: &std::collections::BTreeSet<std::path::PathBuf>| -> Vec<String> {
    set.iter().map(|p| path_to_git_format(p)).collect()
  };

  let output = json!({
      "planId": analysis.plan.id().full(),
      "enabled": analysis.enabled,
      "referenceBranch": ctx.config.reference_branch,
      "baseBranch": ctx.config.base_branch,
      "changedFiles": {
          "committed": paths(&analysis.changes.committed),
          "uncommitted": paths(&analysis.changes.uncommitted),
          "untracked": paths(&analysis.changes.untracked)
      },
      "directlyChanged": analysis.directly_changed,
      "build": analysis.plan.build,
      "excluded": analysis.plan.excluded,
      "summary": {
          "build": analysis.plan.build.len(),
          "tested": analysis.plan.tested().len(),
          "testsSkipped": analysis.plan.tests_skipped().len(),
          "excluded": analysis.plan.excluded.len()
      }
  });

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

/// Display only built module ids, in build order
fn display_names(analysis: &AffectedAnalysis) {
  for module in &analysis.plan.build {
    println!("{}", module.id);
  }
}
