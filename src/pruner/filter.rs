use regex::Regex;

use crate::common::errors::ConfigError;

/// Name-based rules deciding which entries the pruner may touch.
///
/// Patterns are searched anywhere in the entry's base name, never its full
/// path. Exclusion wins over inclusion.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    exclude: Option<Regex>,
    include: Option<Regex>,
}

impl EntryFilter {
    /// Compile the patterns. Identical include and exclude patterns would
    /// leave nothing to process and are rejected.
    pub fn new(exclude: Option<&str>, include: Option<&str>) -> Result<Self, ConfigError> {
        if let (Some(ex), Some(inc)) = (exclude, include) {
            if ex == inc {
                return Err(ConfigError::ConflictingPatterns {
                    pattern: ex.to_string(),
                });
            }
        }

        Ok(Self {
            exclude: exclude.map(|p| compile("exclude", p)).transpose()?,
            include: include.map(|p| compile("include", p)).transpose()?,
        })
    }

    /// Only an exclusion pattern
    pub fn excluding(pattern: &str) -> Result<Self, ConfigError> {
        Self::new(Some(pattern), None)
    }

    /// Excluded entries are skipped entirely: not recursed into, not counted
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Whether a file with this name may be deleted once expired.
    /// Without an include pattern every file is a candidate.
    pub fn is_candidate(&self, name: &str) -> bool {
        self.include.as_ref().map_or(true, |re| re.is_match(name))
    }

    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(|re| re.as_str())
    }

    pub fn include_pattern(&self) -> Option<&str> {
        self.include.as_ref().map(|re| re.as_str())
    }
}

fn compile(kind: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        kind,
        pattern: pattern.to_string(),
        source,
    })
}
