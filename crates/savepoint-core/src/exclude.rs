//! Exclusion filtering for commit candidates.
//!
//! Evaluation order (short-circuit OR):
//! 1. Implicit rule: an exact `.git` path segment anywhere in the raw
//!    candidate. Constant, compiled once.
//! 2. User path pattern, tested against the full candidate path.
//! 3. User file pattern, tested against the final path segment only.
//!
//! User patterns are re-resolved and recompiled on every call since their
//! source can change at runtime. An invalid pattern surfaces
//! [`CoreError::PatternCompilation`] here, at use time, not when the
//! configuration was built.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};

/// Matches an exact `.git` segment: the whole path, a leading segment, a
/// trailing segment, or an interior one. `foo.git` and `.gitfoo` do not
/// match.
static GIT_SEGMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^\.git$)|(?:^\.git/)|(?:/\.git$)|(?:/\.git/)").expect("constant pattern")
});

/// Decides, per candidate path, whether it should be silently skipped.
pub struct ExclusionFilter {
    config: Arc<EngineConfig>,
}

impl ExclusionFilter {
    /// Create a filter over live configuration.
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Whether the raw candidate path is excluded from versioning.
    ///
    /// Every exclusion is logged before returning.
    pub fn is_excluded(&self, candidate: &str) -> CoreResult<bool> {
        if GIT_SEGMENT_PATTERN.is_match(candidate) {
            info!(path = candidate, "excluded: .git segment");
            return Ok(true);
        }

        if let Some(source) = self.config.exclude_paths_pattern() {
            if compile(&source)?.is_match(candidate) {
                info!(path = candidate, pattern = %source, "excluded by path pattern");
                return Ok(true);
            }
        }

        if let Some(source) = self.config.exclude_files_pattern() {
            if compile(&source)?.is_match(final_segment(candidate)) {
                info!(path = candidate, pattern = %source, "excluded by file pattern");
                return Ok(true);
            }
        }

        Ok(false)
    }
}

fn compile(source: &str) -> CoreResult<Regex> {
    Regex::new(source).map_err(|e| CoreError::PatternCompilation {
        pattern: source.to_string(),
        message: e.to_string(),
    })
}

/// The portion of the path after the final separator.
fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
