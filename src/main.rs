mod adapters;
mod cargo;
mod commands;
mod core;
mod graph;
mod utils;

use clap::{Args, Parser, Subcommand};
use core::error::{ImpactError, print_error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Build and test only the modules affected by your changes
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Impact(ImpactCli),
}

#[derive(Parser)]
#[command(name = "impact")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct ImpactCli {
  /// Verbose logging (debug level unless RUST_LOG is set)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Options shared by every command that loads the workspace
#[derive(Args)]
struct WorkspaceArgs {
  /// Override a property (repeatable), e.g. --set reference-branch=refs/remotes/origin/develop
  #[arg(long = "set", value_name = "NAME=VALUE")]
  overrides: Vec<String>,

  /// Use a JSON project model instead of cargo metadata
  #[arg(long, value_name = "FILE")]
  model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the build plan for the current changes
  Plan {
    #[command(flatten)]
    workspace: WorkspaceArgs,
    /// Also build upstream dependencies of impacted modules
    #[arg(long)]
    also_make: bool,
    /// Output format: text (default), json, names
    #[arg(long, default_value = "text")]
    format: String,
  },

  /// Test impacted modules (build-only where tests are skipped)
  Test {
    #[command(flatten)]
    workspace: WorkspaceArgs,
    /// Also build upstream dependencies of impacted modules
    #[arg(long)]
    also_make: bool,
    /// Show the cargo commands without executing
    #[arg(long)]
    dry_run: bool,
    /// Additional arguments to pass to cargo
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    cargo_args: Vec<String>,
  },

  /// List every property with its default and effective value
  Properties {
    #[command(flatten)]
    workspace: WorkspaceArgs,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let CargoCli::Impact(cli) = CargoCli::parse();
  init_logging(cli.verbose);

  let cwd = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let workspace = match &cli.command {
    Commands::Plan { workspace, .. } | Commands::Test { workspace, .. } | Commands::Properties { workspace } => {
      workspace
    }
  };

  // Configuration, model and graph are resolved once, before any git access
  let ctx = match core::context::WorkspaceContext::build(&cwd, workspace.model.as_deref(), &workspace.overrides) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Plan { also_make, format, .. } => commands::run_plan(&ctx, also_make, format),
    Commands::Test {
      also_make,
      dry_run,
      cargo_args,
      ..
    } => commands::run_test(&ctx, also_make, dry_run, cargo_args),
    Commands::Properties { .. } => commands::run_properties(&ctx),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ImpactError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
