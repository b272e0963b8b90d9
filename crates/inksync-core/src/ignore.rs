//! Gitignore-style exclusion rules for tree enumeration.
//!
//! Supported syntax: `#` comments, `!` negation, `*`, `?`, `**`, trailing `/`
//! for directory-only patterns, and leading `/` (or any inner `/`) to anchor
//! a pattern at the root. The last matching rule wins. The metadata
//! directory and conflict artifacts are always ignored.
//!
//! Unlike git, a negated rule can re-include a file below an excluded
//! directory, since only files are ever matched.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{CoreError, Result};
use crate::path::{is_conflict_file, is_meta_path};

/// Name of the pattern file read from the root of a synced directory.
pub const IGNORE_FILE: &str = ".inksyncignore";

struct Rule {
    matcher: GlobSet,
    negated: bool,
}

/// A compiled ignore file.
#[derive(Default)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Rules that only carry the implicit exclusions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile the contents of an ignore file.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = Vec::new();
        for line in text.lines() {
            if let Some(rule) = compile_line(line)? {
                rules.push(rule);
            }
        }
        Ok(Self { rules })
    }

    /// Number of explicit rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a relative file path is excluded from sync.
    pub fn is_ignored(&self, path: &str) -> bool {
        if is_meta_path(path) || is_conflict_file(path) {
            return true;
        }
        let mut ignored = false;
        for rule in &self.rules {
            if rule.matcher.is_match(path) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

impl std::fmt::Debug for IgnoreRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgnoreRules")
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn compile_line(line: &str) -> Result<Option<Rule>> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (negated, mut pattern) = match line.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, line.strip_prefix('\\').unwrap_or(line)),
    };

    let dir_only = pattern.ends_with('/');
    if dir_only {
        pattern = pattern.trim_end_matches('/');
    }
    let anchored = pattern.starts_with('/') || pattern.contains('/');
    let pattern = pattern.trim_start_matches('/');
    if pattern.is_empty() {
        return Ok(None);
    }

    let globs: Vec<String> = match (anchored, dir_only) {
        (true, false) => vec![pattern.to_string(), format!("{pattern}/**")],
        (true, true) => vec![format!("{pattern}/**")],
        (false, false) => vec![format!("**/{pattern}"), format!("**/{pattern}/**")],
        (false, true) => vec![format!("**/{pattern}/**")],
    };

    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let glob = GlobBuilder::new(&glob)
            .literal_separator(true)
            .build()
            .map_err(|e| CoreError::InvalidPattern {
                pattern: line.to_string(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }
    let matcher = builder.build().map_err(|e| CoreError::InvalidPattern {
        pattern: line.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Some(Rule { matcher, negated }))
}
