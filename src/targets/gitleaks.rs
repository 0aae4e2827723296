//! gitleaks config lowering
//!
//! The richest target: path, keyword, and entropy support, dependency
//! mirrors, and one allowlist per EXCLUDE filter. An allowlist can scope
//! its regexes to only one of line/match/secret, so colliding scopes are
//! folded into the chosen target with a warning.

use serde::Serialize;

use crate::diagnostics::{Translation, Warning, WarningKind};
use crate::pattern::{compose_match, or_patterns, strings_to_pattern, Pattern};
use crate::schema::{ExcludeFilter, Rule, RuleId};
use crate::targets::common::{excluded_filters, keywords, min_entropy, required_filters};

/// What an allowlist regex is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegexTarget {
    Line,
    Match,
    Secret,
}

impl RegexTarget {
    fn as_str(self) -> &'static str {
        match self {
            RegexTarget::Line => "line",
            RegexTarget::Match => "match",
            RegexTarget::Secret => "secret",
        }
    }
}

/// How an allowlist combines its conditions; lowering always ANDs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowlistCondition {
    And,
}

/// One exclusion derived from an EXCLUDE filter
#[derive(Debug, Serialize)]
pub struct Allowlist {
    pub condition: AllowlistCondition,
    #[serde(rename = "regexTarget", skip_serializing_if = "Option::is_none")]
    pub regex_target: Option<RegexTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regexes: Option<Vec<Pattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

/// A requirement that another rule match nearby
#[derive(Debug, Serialize)]
pub struct Required {
    pub id: RuleId,
    #[serde(rename = "withinLines", skip_serializing_if = "Option::is_none")]
    pub within_lines: Option<u32>,
    #[serde(rename = "withinColumns", skip_serializing_if = "Option::is_none")]
    pub within_columns: Option<u32>,
}

/// One lowered rule; the arrays of tables stay last so the toml entry
/// serializes with scalar keys first
#[derive(Debug, Serialize)]
pub struct GitleaksRule {
    pub id: RuleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Pattern>,
    pub regex: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    pub tags: Vec<String>,
    #[serde(rename = "skipReport")]
    pub skip_report: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<Required>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowlists: Option<Vec<Allowlist>>,
}

/// The complete gitleaks config document
#[derive(Debug, Serialize)]
pub struct Config {
    pub rules: Vec<GitleaksRule>,
}

fn populated<T>(list: &Option<Vec<T>>) -> bool {
    list.as_ref().is_some_and(|l| !l.is_empty())
}

/// A filter's path patterns plus its literal-derived path pattern
fn path_patterns(
    patterns: Option<&[Pattern]>,
    strings: Option<&[String]>,
) -> Option<Vec<Pattern>> {
    let mut collected = patterns.map(<[Pattern]>::to_vec).unwrap_or_default();
    if let Some(pattern) = strings_to_pattern(strings.unwrap_or_default()) {
        collected.push(pattern);
    }
    (!collected.is_empty()).then_some(collected)
}

/// The rule's path constraint: every REQUIRE filter's path patterns,
/// OR'd together
fn path(rule: &Rule) -> Option<Pattern> {
    let mut patterns = Vec::new();
    for filter in required_filters(rule) {
        if let Some(mut filter_patterns) = path_patterns(
            filter.path_patterns.as_deref(),
            filter.path_strings.as_deref(),
        ) {
            patterns.append(&mut filter_patterns);
        }
    }
    or_patterns(&patterns)
}

fn tags(rule: &Rule) -> Vec<String> {
    let mut tags = vec![format!("kind:{}", rule.meta.kind)];
    if let Some(confidence) = rule.meta.confidence {
        tags.push(format!("confidence:{}", confidence));
    }
    if let Some(extra) = &rule.meta.tags {
        tags.extend(extra.iter().cloned());
    }
    tags
}

fn required(rule: &Rule) -> Option<Vec<Required>> {
    let dependencies = rule.dependencies();
    if dependencies.is_empty() {
        return None;
    }
    Some(
        dependencies
            .iter()
            .map(|dep| Required {
                id: dep.rule_id.clone(),
                within_lines: dep.within_lines,
                within_columns: dep.within_columns,
            })
            .collect(),
    )
}

fn description(rule: &Rule) -> Option<String> {
    match &rule.meta.description {
        Some(description) if !description.is_empty() => Some(description.clone()),
        _ => Some(rule.meta.name.clone()),
    }
}

/// Pick the regex target and collect regexes for one EXCLUDE filter.
///
/// Gitleaks cannot AND multiple allowlist pattern scopes, so the first
/// populated scope wins the target (context > match > target) and every
/// other populated scope is folded into the same list with a warning.
fn allowlist_regexes(
    rule: &Rule,
    filter: &ExcludeFilter,
    warnings: &mut Vec<Warning>,
) -> (Option<RegexTarget>, Option<Vec<Pattern>>) {
    let mut patterns: Vec<Pattern> = Vec::new();
    let mut regex_target: Option<RegexTarget> = None;

    if populated(&filter.context_patterns) || populated(&filter.context_strings) {
        regex_target = Some(RegexTarget::Line);

        if let Some(context_patterns) = &filter.context_patterns {
            patterns.extend(context_patterns.iter().cloned());
        }
        if let Some(pattern) =
            strings_to_pattern(filter.context_strings.as_deref().unwrap_or_default())
        {
            patterns.push(pattern);
        }
    }

    if populated(&filter.match_patterns) || populated(&filter.match_strings) {
        match regex_target {
            Some(target) => warnings.push(Warning::new(
                rule.id.clone(),
                WarningKind::ScopeFolded {
                    scope: "match",
                    regex_target: target.as_str(),
                },
            )),
            None => regex_target = Some(RegexTarget::Match),
        }

        if let Some(match_patterns) = &filter.match_patterns {
            patterns.extend(match_patterns.iter().cloned());
        }
        if let Some(pattern) =
            strings_to_pattern(filter.match_strings.as_deref().unwrap_or_default())
        {
            patterns.push(pattern);
        }
    }

    if populated(&filter.target_patterns) {
        match regex_target {
            Some(target) => warnings.push(Warning::new(
                rule.id.clone(),
                WarningKind::ScopeFolded {
                    scope: "target",
                    regex_target: target.as_str(),
                },
            )),
            None => regex_target = Some(RegexTarget::Secret),
        }

        if let Some(target_patterns) = &filter.target_patterns {
            patterns.extend(target_patterns.iter().cloned());
        }
    }

    if patterns.is_empty() {
        return (None, None);
    }
    (regex_target, Some(patterns))
}

fn allowlists(rule: &Rule, warnings: &mut Vec<Warning>) -> Option<Vec<Allowlist>> {
    let filters = excluded_filters(rule);
    if filters.is_empty() {
        return None;
    }

    let mut allowlists = Vec::new();
    for filter in filters {
        let (regex_target, regexes) = allowlist_regexes(rule, filter, warnings);
        allowlists.push(Allowlist {
            condition: AllowlistCondition::And,
            regex_target,
            paths: path_patterns(
                filter.path_patterns.as_deref(),
                filter.path_strings.as_deref(),
            ),
            regexes,
            stopwords: filter.target_strings.clone(),
        });
    }

    Some(allowlists)
}

fn lower(rule: &Rule, warnings: &mut Vec<Warning>) -> GitleaksRule {
    if !rule.analyzers().is_empty() {
        warnings.push(Warning::new(rule.id.clone(), WarningKind::AnalyzersIgnored));
    }

    GitleaksRule {
        id: rule.id.clone(),
        description: description(rule),
        path: path(rule),
        regex: compose_match(&rule.target),
        entropy: min_entropy(rule),
        keywords: keywords(rule),
        tags: tags(rule),
        skip_report: !rule.meta.report,
        required: required(rule),
        allowlists: allowlists(rule, warnings),
    }
}

/// Lower every rule into the gitleaks config document
pub fn translate(rules: &[Rule]) -> Translation<Config> {
    let mut warnings = Vec::new();
    let rules = rules
        .iter()
        .map(|rule| lower(rule, &mut warnings))
        .collect();

    Translation {
        document: Config { rules },
        warnings,
    }
}
