//! Error types for cargo-impact with contextual messages and exit codes
//!
//! Every fatal condition in the engine maps to one of these variants. Nothing is
//! retried: errors propagate with `?` up to `main`, which prints the message plus
//! an optional help line and exits with the variant's code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-impact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (unknown property, bad value, invalid project model)
  User = 1,
  /// System error (git, network, I/O)
  System = 2,
  /// Module graph is unusable (cycles)
  Graph = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-impact
#[derive(Debug)]
pub enum ImpactError {
  /// Configuration errors, raised before any VCS access
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Module graph errors
  Graph(GraphError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ImpactError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ImpactError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ImpactError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ImpactError::Message { message, context, help } => ImpactError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ImpactError::Io(err) => ImpactError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ImpactError::Config(_) => ExitCode::User,
      ImpactError::Git(_) => ExitCode::System,
      ImpactError::Graph(_) => ExitCode::Graph,
      ImpactError::Io(_) => ExitCode::System,
      ImpactError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ImpactError::Config(e) => e.help_message(),
      ImpactError::Git(e) => e.help_message(),
      ImpactError::Graph(e) => e.help_message(),
      ImpactError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ImpactError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ImpactError::Config(e) => write!(f, "{}", e),
      ImpactError::Git(e) => write!(f, "{}", e),
      ImpactError::Graph(e) => write!(f, "{}", e),
      ImpactError::Io(e) => write!(f, "I/O error: {}", e),
      ImpactError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ImpactError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ImpactError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ImpactError {
  fn from(err: io::Error) -> Self {
    ImpactError::Io(err)
  }
}

impl From<String> for ImpactError {
  fn from(msg: String) -> Self {
    ImpactError::message(msg)
  }
}

impl From<&str> for ImpactError {
  fn from(msg: &str) -> Self {
    ImpactError::message(msg)
  }
}

impl From<ConfigError> for ImpactError {
  fn from(err: ConfigError) -> Self {
    ImpactError::Config(err)
  }
}

impl From<GitError> for ImpactError {
  fn from(err: GitError) -> Self {
    ImpactError::Git(err)
  }
}

impl From<GraphError> for ImpactError {
  fn from(err: GraphError) -> Self {
    ImpactError::Graph(err)
  }
}

impl From<toml_edit::TomlError> for ImpactError {
  fn from(err: toml_edit::TomlError) -> Self {
    ImpactError::message(format!("TOML parse error: {}", err))
  }
}

impl From<cargo_metadata::Error> for ImpactError {
  fn from(err: cargo_metadata::Error) -> Self {
    ImpactError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<serde_json::Error> for ImpactError {
  fn from(err: serde_json::Error) -> Self {
    ImpactError::message(format!("JSON error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Property name not in the known table
  UnknownProperty { name: String, source: String, allowed: Vec<String> },

  /// `IMPACT_*` environment variable that names no property
  UnknownEnvVar { name: String, allowed: Vec<String> },

  /// Property value cannot be interpreted
  InvalidValue {
    name: String,
    value: String,
    expected: String,
  },

  /// Two modules share the same id
  DuplicateModule { id: String },

  /// A branch that must be fetched is not a remote-tracking ref
  NotFetchable { branch: String },

  /// Project model file is malformed
  ModelInvalid { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::UnknownProperty { allowed, .. } => Some(format!("Allowed properties:\n  {}", allowed.join("\n  "))),
      ConfigError::UnknownEnvVar { name, allowed } => Some(format!(
        "Unset {} or rename it. Allowed environment variables:\n  {}",
        name,
        allowed.join("\n  ")
      )),
      ConfigError::NotFetchable { .. } => {
        Some("Use a remote-tracking ref such as `refs/remotes/origin/main` or `origin/main`.".to_string())
      }
      ConfigError::DuplicateModule { .. } => Some("Module ids must be unique across the project.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::UnknownProperty { name, source, .. } => {
        write!(f, "Unknown property '{}' in {}", name, source)
      }
      ConfigError::UnknownEnvVar { name, .. } => {
        write!(f, "Unknown environment variable '{}' (the IMPACT_ prefix is reserved for properties)", name)
      }
      ConfigError::InvalidValue { name, value, expected } => {
        write!(f, "Invalid value '{}' for property '{}' (expected {})", value, name, expected)
      }
      ConfigError::DuplicateModule { id } => {
        write!(f, "Module '{}' is declared more than once", id)
      }
      ConfigError::NotFetchable { branch } => {
        write!(f, "Cannot fetch '{}': not a remote-tracking branch", branch)
      }
      ConfigError::ModelInvalid { path, reason } => {
        write!(f, "Invalid project model {}: {}", path.display(), reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Branch or ref does not resolve to a commit
  RefNotFound { reference: String },

  /// Fetch failed (network, authentication)
  AccessFailed { remote: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run cargo-impact inside a git work tree (checked: {})",
        path.display()
      )),
      GitError::RefNotFound { .. } => Some(
        "Check `reference-branch`/`base-branch`, or enable `fetch-reference-branch` to fetch it first.".to_string(),
      ),
      GitError::AccessFailed { reason, .. } => {
        if reason.contains("Permission denied") || reason.contains("publickey") {
          Some("Check `repository-ssh-key` and your access to the remote.".to_string())
        } else {
          None
        }
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::RefNotFound { reference } => {
        write!(f, "Git ref not found: {}", reference)
      }
      GitError::AccessFailed { remote, reason } => {
        write!(f, "Fetch from '{}' failed: {}", remote, reason.trim())
      }
    }
  }
}

/// Module graph errors
#[derive(Debug)]
pub enum GraphError {
  /// Dependency cycle among the listed modules
  Cycle { modules: Vec<String> },
}

impl GraphError {
  fn help_message(&self) -> Option<String> {
    match self {
      GraphError::Cycle { .. } => Some("Break the cycle; impact propagation is undefined over cycles.".to_string()),
    }
  }
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::Cycle { modules } => {
        write!(f, "Module dependency cycle detected: {}", modules.join(" -> "))
      }
    }
  }
}

/// Result type alias for cargo-impact
pub type ImpactResult<T> = Result<T, ImpactError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ImpactResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ImpactResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ImpactError>,
{
  fn context(self, ctx: impl Into<String>) -> ImpactResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ImpactResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ImpactError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
