//! Pattern composition algebra
//!
//! Builds backend regex strings from validated sub-patterns and from
//! literal string sets. All operations are pure; composition over valid
//! inputs always yields a valid pattern (a property the tests exercise).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::schema::{SchemaError, Target};

/// A regex string guaranteed to compile under the reference engine.
///
/// Invalid patterns are rejected when a document is loaded, never at
/// translation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Pattern(String);

impl Pattern {
    /// Validate and wrap a raw regex string
    pub fn new(raw: impl Into<String>) -> Result<Self, SchemaError> {
        let raw = raw.into();
        if let Err(e) = regex::Regex::new(&raw) {
            return Err(SchemaError::InvalidPattern {
                pattern: raw,
                message: e.to_string(),
            });
        }
        Ok(Pattern(raw))
    }

    /// Wrap an already-composed pattern without re-validation.
    ///
    /// Only the composition functions below use this; they never produce
    /// an invalid pattern from valid inputs.
    pub(crate) fn compose(raw: String) -> Self {
        Pattern(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Pattern::new(raw).map_err(serde::de::Error::custom)
    }
}

/// How a sub-pattern is wrapped when composed into a larger pattern.
///
/// A pattern is capturing, non-capturing, or left bare; there is no state
/// in which it could be both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Emit the pattern unchanged
    None,
    /// Wrap as a capturing group: `(p)`
    Capturing,
    /// Wrap as a non-capturing group: `(?:p)`
    NonCapturing,
}

/// Wrap a pattern according to the grouping mode
pub fn group(pattern: &Pattern, mode: GroupMode) -> Pattern {
    match mode {
        GroupMode::None => pattern.clone(),
        GroupMode::Capturing => Pattern::compose(format!("({})", pattern)),
        GroupMode::NonCapturing => Pattern::compose(format!("(?:{})", pattern)),
    }
}

/// Build the full match pattern for a target.
///
/// Present affixes are wrapped non-capturing; the core is wrapped in a
/// capturing group only when an affix is present. A bare target passes
/// through unchanged: several backends treat a pattern with no explicit
/// capture group as "the whole match is the secret", so adding a group
/// would change what they report.
pub fn compose_match(target: &Target) -> Pattern {
    let prefix = target
        .prefix_pattern
        .as_ref()
        .map(|p| group(p, GroupMode::NonCapturing));
    let suffix = target
        .suffix_pattern
        .as_ref()
        .map(|p| group(p, GroupMode::NonCapturing));

    let core_mode = if prefix.is_some() || suffix.is_some() {
        GroupMode::Capturing
    } else {
        GroupMode::None
    };
    let core = group(&target.pattern, core_mode);

    let mut composed = String::new();
    if let Some(prefix) = prefix {
        composed.push_str(prefix.as_str());
    }
    composed.push_str(core.as_str());
    if let Some(suffix) = suffix {
        composed.push_str(suffix.as_str());
    }
    Pattern::compose(composed)
}

/// Turn a set of literal strings into one case-insensitive pattern.
///
/// Each literal is escaped and lower-cased individually; the
/// case-insensitive flag is prefixed once for the whole result, not per
/// alternative.
pub fn strings_to_pattern(strings: &[String]) -> Option<Pattern> {
    match strings {
        [] => None,
        [only] => Some(Pattern::compose(format!(
            "(?i){}",
            regex::escape(only).to_lowercase()
        ))),
        many => {
            let alternatives: Vec<String> = many
                .iter()
                .map(|s| format!("(?:{})", regex::escape(s).to_lowercase()))
                .collect();
            Some(Pattern::compose(format!("(?i){}", alternatives.join("|"))))
        }
    }
}

/// OR-combine patterns, in input order
pub fn or_patterns(patterns: &[Pattern]) -> Option<Pattern> {
    match patterns {
        [] => None,
        [only] => Some(only.clone()),
        many => {
            let alternatives: Vec<String> =
                many.iter().map(|p| format!("(?:{})", p)).collect();
            Some(Pattern::compose(alternatives.join("|")))
        }
    }
}
