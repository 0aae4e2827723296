//! github secret-scanning custom pattern lowering
//!
//! The flattest target: the pattern parts are emitted separately rather
//! than composed, and each usable filter becomes an indexed
//! post-processing pair.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::diagnostics::{Translation, Warning, WarningKind};
use crate::pattern::{or_patterns, strings_to_pattern, Pattern};
use crate::schema::{Filter, Rule};

/// The complete custom-pattern document
#[derive(Debug, Serialize)]
pub struct Config {
    pub patterns: Vec<PatternEntry>,
}

/// Whether a post-processing pattern must or must not match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessingRule {
    MustMatch,
    MustNotMatch,
}

/// One lowered rule.
///
/// The wire format is a flat mapping whose `post_processing_{i}` /
/// `post_processing_rule_{i}` key pairs are indexed, which derives cannot
/// express, so serialization is hand-written. Indices count emitted
/// pairs: a skipped filter does not leave a hole.
#[derive(Debug)]
pub struct PatternEntry {
    pub secret_format: Pattern,
    pub before_secret: Option<Pattern>,
    pub after_secret: Option<Pattern>,
    pub post_processing: Vec<(Pattern, PostProcessingRule)>,
}

impl Serialize for PatternEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("secret_format", &self.secret_format)?;
        if let Some(before) = &self.before_secret {
            map.serialize_entry("before_secret", before)?;
        }
        if let Some(after) = &self.after_secret {
            map.serialize_entry("after_secret", after)?;
        }
        for (i, (pattern, rule)) in self.post_processing.iter().enumerate() {
            map.serialize_entry(&format!("post_processing_{}", i), pattern)?;
            map.serialize_entry(&format!("post_processing_rule_{}", i), rule)?;
        }
        map.end()
    }
}

fn lower(rule: &Rule, warnings: &mut Vec<Warning>) -> PatternEntry {
    let mut post_processing = Vec::new();

    for (index, filter) in rule.filters().iter().enumerate() {
        let mut patterns = Vec::new();
        if let Some(pattern) = strings_to_pattern(filter.target_strings()) {
            patterns.push(pattern);
        }

        let post_proc_rule = match filter {
            Filter::Require(_) => PostProcessingRule::MustMatch,
            Filter::Exclude(exclude) => {
                if let Some(target_patterns) = &exclude.target_patterns {
                    patterns.extend(target_patterns.iter().cloned());
                }
                PostProcessingRule::MustNotMatch
            }
        };

        let Some(combined) = or_patterns(&patterns) else {
            warnings.push(Warning::new(
                rule.id.clone(),
                WarningKind::EmptyFilter { index },
            ));
            continue;
        };
        post_processing.push((combined, post_proc_rule));
    }

    PatternEntry {
        secret_format: rule.target.pattern.clone(),
        before_secret: rule.target.prefix_pattern.clone(),
        after_secret: rule.target.suffix_pattern.clone(),
        post_processing,
    }
}

/// Lower every rule into the github custom-pattern document
pub fn translate(rules: &[Rule]) -> Translation<Config> {
    let mut warnings = Vec::new();
    let patterns = rules
        .iter()
        .map(|rule| lower(rule, &mut warnings))
        .collect();

    Translation {
        document: Config { patterns },
        warnings,
    }
}
