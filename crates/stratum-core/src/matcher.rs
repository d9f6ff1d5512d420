//! File pattern matching for override blocks
//!
//! Patterns follow path-glob semantics: `*` matches within one path segment,
//! `**` spans directories, and `[...]` bracket classes are supported. Matching
//! is case-sensitive. A pattern without a `/` is matched against the file's
//! base name, so `*.ts` applies to `src/deep/file.ts`.

use crate::error::StratumError;
use crate::result::Result;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    pattern: Pattern,
    base_name_only: bool,
}

/// A compiled set of file patterns.
///
/// The set matches a path when any of its patterns does. An empty set never
/// matches anything.
#[derive(Debug, Clone, Default)]
pub struct GlobMatcher {
    patterns: Vec<CompiledPattern>,
}

impl GlobMatcher {
    /// Compile a pattern set, failing on the first unparseable pattern.
    ///
    /// `layer` names the configuration layer the patterns come from and is
    /// only used for error attribution.
    pub fn new<S: AsRef<str>>(patterns: &[S], layer: &str) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for source in patterns {
            let source = source.as_ref();
            let trimmed = source.trim_start_matches("./").trim_start_matches('/');

            if trimmed.is_empty() {
                return Err(StratumError::invalid_glob(source, layer, "empty pattern"));
            }

            let pattern = Pattern::new(trimmed)
                .map_err(|e| StratumError::invalid_glob(source, layer, e.to_string()))?;

            compiled.push(CompiledPattern {
                source: source.to_string(),
                pattern,
                base_name_only: !trimmed.contains('/'),
            });
        }

        Ok(Self { patterns: compiled })
    }

    /// Whether the set contains no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The patterns as written in the configuration
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }

    /// Match a `/`-separated path that is already relative to the base directory
    pub fn matches(&self, relative_path: &str) -> bool {
        let base_name = relative_path.rsplit('/').next().unwrap_or(relative_path);

        self.patterns.iter().any(|compiled| {
            let candidate = if compiled.base_name_only {
                base_name
            } else {
                relative_path
            };
            compiled.pattern.matches_with(candidate, MATCH_OPTIONS)
        })
    }
}
