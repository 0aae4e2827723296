//! trufflehog detector lowering
//!
//! One custom detector per rule. Trufflehog verifies against every
//! declared http endpoint, so unlike kingfisher all http analyzers
//! survive; only non-http kinds are dropped.

use serde::Serialize;

use crate::diagnostics::{Translation, Warning, WarningKind};
use crate::pattern::{compose_match, strings_to_pattern, Pattern};
use crate::schema::{AnalyzerKind, HttpUrl, Rule, RuleId};
use crate::targets::common::{excluded_filters, keywords, min_entropy};

/// The single named regex slot a detector exposes
#[derive(Debug, Serialize)]
pub struct RegexMap {
    pub target: Pattern,
}

/// An endpoint checked to verify a candidate secret live
#[derive(Debug, Serialize)]
pub struct Verify {
    pub endpoint: HttpUrl,
    /// Set exactly when the endpoint scheme is plain http
    #[serde(rename = "unsafe", skip_serializing_if = "Option::is_none")]
    pub unsafe_endpoint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
}

/// One lowered rule
#[derive(Debug, Serialize)]
pub struct Detector {
    pub name: RuleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    pub regex: RegexMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_words: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_regexes_match: Option<Vec<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<Vec<Verify>>,
}

/// The complete trufflehog config document
#[derive(Debug, Serialize)]
pub struct Config {
    pub detectors: Vec<Detector>,
}

/// Literal target strings from every EXCLUDE filter, in order
fn exclude_words(rule: &Rule) -> Option<Vec<String>> {
    let filters = excluded_filters(rule);
    if filters.is_empty() {
        return None;
    }

    let words: Vec<String> = filters
        .iter()
        .filter_map(|filter| filter.target_strings.as_ref())
        .flatten()
        .cloned()
        .collect();

    (!words.is_empty()).then_some(words)
}

/// Match patterns plus each filter's literal-derived match alternation
fn exclude_regexes_match(rule: &Rule) -> Option<Vec<Pattern>> {
    let filters = excluded_filters(rule);
    if filters.is_empty() {
        return None;
    }

    let mut patterns = Vec::new();
    for filter in filters {
        if let Some(match_patterns) = &filter.match_patterns {
            patterns.extend(match_patterns.iter().cloned());
        }
        if let Some(pattern) =
            strings_to_pattern(filter.match_strings.as_deref().unwrap_or_default())
        {
            patterns.push(pattern);
        }
    }

    (!patterns.is_empty()).then_some(patterns)
}

/// One verify entry per http analyzer; other kinds are dropped
fn verify(rule: &Rule, warnings: &mut Vec<Warning>) -> Option<Vec<Verify>> {
    let analyzers = rule.analyzers();
    if analyzers.is_empty() {
        return None;
    }

    let mut verifiers = Vec::new();
    for analyzer in analyzers {
        if analyzer.meta.kind != AnalyzerKind::Http {
            warnings.push(Warning::new(
                rule.id.clone(),
                WarningKind::UnsupportedAnalyzerKind {
                    kind: analyzer.meta.kind,
                },
            ));
            continue;
        }

        verifiers.push(Verify {
            endpoint: analyzer.action.url.clone(),
            unsafe_endpoint: (analyzer.action.url.scheme() == "http").then_some(true),
            headers: analyzer
                .action
                .headers
                .as_ref()
                .filter(|headers| !headers.is_empty())
                .map(|headers| {
                    headers
                        .iter()
                        .map(|(name, value)| format!("{}: {}", name, value))
                        .collect()
                }),
        });
    }

    (!verifiers.is_empty()).then_some(verifiers)
}

fn lower(rule: &Rule, warnings: &mut Vec<Warning>) -> Detector {
    Detector {
        name: rule.id.clone(),
        keywords: keywords(rule),
        regex: RegexMap {
            target: compose_match(&rule.target),
        },
        entropy: min_entropy(rule),
        exclude_words: exclude_words(rule),
        exclude_regexes_match: exclude_regexes_match(rule),
        verify: verify(rule, warnings),
    }
}

/// Lower every rule into the trufflehog config document
pub fn translate(rules: &[Rule]) -> Translation<Config> {
    let mut warnings = Vec::new();
    let detectors = rules
        .iter()
        .map(|rule| lower(rule, &mut warnings))
        .collect();

    Translation {
        document: Config { detectors },
        warnings,
    }
}
