//! Glob pattern helpers: brace expansion and path matching.
//!
//! `glob` understands `*`, `**`, `?` and `[...]`; `{a,b}` alternation is
//! expanded here into one pattern per alternative before matching.

use glob::{MatchOptions, Pattern};

use super::SourceError;

/// `*` never crosses a `/`, so `*.html` selects top-level markup only.
pub const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Whether a pattern contains glob metacharacters.
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Expand `{a,b}` alternation, innermost-first, into plain glob patterns.
///
/// `img/*.{jpg,png}` becomes `img/*.jpg` and `img/*.png`. Unbalanced braces
/// are left untouched and reach `glob` as literals.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = first_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    split_alternatives(&pattern[open + 1..close])
        .into_iter()
        .flat_map(|alt| expand_braces(&format!("{prefix}{alt}{suffix}")))
        .collect()
}

/// Byte range of the first top-level `{...}` group.
fn first_group(pattern: &str) -> Option<(usize, usize)> {
    let open = pattern.find('{')?;
    let mut depth = 0usize;
    for (i, c) in pattern[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, open + i));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a group body on commas that are not inside a nested group.
fn split_alternatives(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

/// A source-relative pattern with its braces expanded and compiled.
#[derive(Debug, Clone)]
pub struct PathPattern {
    compiled: Vec<Pattern>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self, SourceError> {
        let compiled = expand_braces(pattern)
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SourceError::Pattern {
                pattern: pattern.to_string(),
                message: err.msg.to_string(),
            })?;
        Ok(Self { compiled })
    }

    /// Match a `/`-separated path relative to the source root.
    pub fn matches(&self, rel: &str) -> bool {
        self.compiled
            .iter()
            .any(|p| p.matches_with(rel, MATCH_OPTIONS))
    }
}
