//! Pattern lists for ignored paths and ignored modules
//!
//! Entries are globs by default; `regex:<expr>` entries are regular expressions.
//! Globs follow globset defaults, so `*` also crosses `/`.

use crate::core::config::Property;
use crate::core::error::{ConfigError, ImpactResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

const REGEX_PREFIX: &str = "regex:";

#[derive(Debug, Clone)]
pub struct PatternSet {
  globs: GlobSet,
  regexes: Vec<Regex>,
}

impl PatternSet {
  /// Compile the patterns configured for `property`.
  pub fn new(property: Property, patterns: &[String]) -> ImpactResult<Self> {
    let mut builder = GlobSetBuilder::new();
    let mut regexes = Vec::new();

    for pattern in patterns {
      if let Some(expr) = pattern.strip_prefix(REGEX_PREFIX) {
        let regex = Regex::new(expr).map_err(|e| invalid(property, pattern, &e.to_string()))?;
        regexes.push(regex);
      } else {
        let glob = Glob::new(pattern).map_err(|e| invalid(property, pattern, &e.to_string()))?;
        builder.add(glob);
      }
    }

    let globs = builder.build().map_err(|e| invalid(property, "", &e.to_string()))?;
    Ok(Self { globs, regexes })
  }

  pub fn matches(&self, candidate: &str) -> bool {
    self.globs.is_match(candidate) || self.regexes.iter().any(|re| re.is_match(candidate))
  }
}

fn invalid(property: Property, pattern: &str, reason: &str) -> ConfigError {
  ConfigError::InvalidValue {
    name: property.name().to_string(),
    value: pattern.to_string(),
    expected: format!("a glob or regex:<expr> ({})", reason),
  }
}
