//! kingfisher rules lowering
//!
//! The only target with a native live-verification block. Kingfisher
//! calls the matched value TOKEN inside its request templates, so
//! variable references are remapped, and it can hold one validation per
//! rule, so only the first http analyzer survives.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::diagnostics::{Translation, Warning, WarningKind};
use crate::pattern::{compose_match, Pattern};
use crate::schema::{
    Analyzer, AnalyzerKind, Confidence, HttpUrl, Rule, RuleId, StatusRange, Syntax, VariableName,
};
use crate::targets::common::min_entropy;
use crate::template::map_vars;

/// Rename table aligning the IR's match variable with kingfisher's
const VARMAP: &[(&str, &str)] = &[("target", "TOKEN")];

/// Valid http status codes; the domain status complements are taken over
const STATUS_DOMAIN: std::ops::RangeInclusive<u16> = 100..=599;

/// The kind of validation kingfisher should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationType {
    Http,
}

/// One response matcher; kingfisher ANDs them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ResponseMatcher {
    StatusMatch {
        status: Vec<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        negative: Option<bool>,
    },
    HeaderMatch {
        header: String,
        expected: Vec<String>,
    },
    JsonValid,
    XmlValid,
    ReportResponse {
        report_response: bool,
    },
}

/// The verification request
#[derive(Debug, Serialize)]
pub struct Request {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_is_html: Option<bool>,
    pub response_matcher: Vec<ResponseMatcher>,
}

#[derive(Debug, Serialize)]
pub struct ValidationContent {
    pub request: Request,
}

#[derive(Debug, Serialize)]
pub struct Validation {
    #[serde(rename = "type")]
    pub validation_type: ValidationType,
    pub content: ValidationContent,
}

/// A dependency on another rule's nearby match
#[derive(Debug, Serialize)]
pub struct RuleRef {
    pub rule_id: RuleId,
    pub variable: VariableName,
}

/// One lowered rule
#[derive(Debug, Serialize)]
pub struct KingfisherRule {
    pub name: String,
    pub id: RuleId,
    pub pattern: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_entropy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<HttpUrl>>,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on_rule: Option<Vec<RuleRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// The complete kingfisher rules document
#[derive(Debug, Serialize)]
pub struct Config {
    pub rules: Vec<KingfisherRule>,
}

/// Canonical header casing: the first letter after any non-letter is
/// uppercased, the rest lowercased
fn title_header(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Expand the declared ranges and keep the smaller of the literal status
/// set and its complement within the valid domain. Ties keep the literal
/// set with no negative flag.
fn resolve_status(ranges: &[StatusRange]) -> (Option<bool>, Vec<u16>) {
    let expanded: BTreeSet<u16> = ranges.iter().flat_map(|range| range.expand()).collect();
    let complement: Vec<u16> = STATUS_DOMAIN
        .clone()
        .filter(|code| !expanded.contains(code))
        .collect();

    if expanded.len() > complement.len() {
        (Some(true), complement)
    } else {
        (None, expanded.into_iter().collect())
    }
}

fn response_is_html(analyzer: &Analyzer) -> Option<bool> {
    analyzer
        .condition
        .iter()
        .any(|matcher| matcher.body_syntax == Some(Syntax::Html))
        .then_some(true)
}

fn response_matchers(analyzer: &Analyzer) -> Vec<ResponseMatcher> {
    let mut matchers = Vec::new();

    for matcher in &analyzer.condition {
        match matcher.body_syntax {
            Some(Syntax::Json) => matchers.push(ResponseMatcher::JsonValid),
            Some(Syntax::Xml) => matchers.push(ResponseMatcher::XmlValid),
            _ => {}
        }

        if let Some(statuses) = &matcher.statuses {
            if !statuses.is_empty() {
                let (negative, status) = resolve_status(statuses);
                matchers.push(ResponseMatcher::StatusMatch { status, negative });
            }
        }

        if let Some(headers) = &matcher.headers {
            for (header, values) in headers {
                matchers.push(ResponseMatcher::HeaderMatch {
                    header: title_header(header),
                    expected: values.clone(),
                });
            }
        }
    }

    if analyzer.meta.report {
        matchers.push(ResponseMatcher::ReportResponse {
            report_response: true,
        });
    }

    matchers
}

/// Build the validation block from the first http analyzer; count
/// everything else into one warning
fn validation(rule: &Rule, warnings: &mut Vec<Warning>) -> Option<Validation> {
    let analyzers = rule.analyzers();
    if analyzers.is_empty() {
        return None;
    }

    let http: Vec<&Analyzer> = analyzers
        .iter()
        .filter(|analyzer| analyzer.meta.kind == AnalyzerKind::Http)
        .collect();
    let unmapped = analyzers.len() - usize::from(!http.is_empty());
    if unmapped > 0 {
        warnings.push(Warning::new(
            rule.id.clone(),
            WarningKind::UnmappedAnalyzers { count: unmapped },
        ));
    }

    let analyzer = *http.first()?;
    if analyzer.action.timeout.is_some_and(|t| t != 0.0) {
        warnings.push(Warning::new(rule.id.clone(), WarningKind::TimeoutIgnored));
    }

    let headers: BTreeMap<String, String> = analyzer
        .action
        .headers
        .as_ref()
        .map(|headers| {
            headers
                .iter()
                .map(|(name, value)| (title_header(name), map_vars(value, VARMAP)))
                .collect()
        })
        .unwrap_or_default();

    Some(Validation {
        validation_type: ValidationType::Http,
        content: ValidationContent {
            request: Request {
                method: analyzer
                    .action
                    .method
                    .as_deref()
                    .unwrap_or("GET")
                    .to_uppercase(),
                url: map_vars(analyzer.action.url.as_str(), VARMAP),
                headers: (!headers.is_empty()).then_some(headers),
                body: analyzer.action.body.as_deref().map(|b| map_vars(b, VARMAP)),
                response_is_html: response_is_html(analyzer),
                response_matcher: response_matchers(analyzer),
            },
        },
    })
}

fn depends_on_rule(rule: &Rule) -> Option<Vec<RuleRef>> {
    let dependencies = rule.dependencies();
    if dependencies.is_empty() {
        return None;
    }
    Some(
        dependencies
            .iter()
            .map(|dep| RuleRef {
                rule_id: dep.rule_id.clone(),
                variable: dep.varname.clone(),
            })
            .collect(),
    )
}

fn lower(rule: &Rule, warnings: &mut Vec<Warning>) -> KingfisherRule {
    if !rule.filters().is_empty() {
        warnings.push(Warning::new(rule.id.clone(), WarningKind::FiltersIgnored));
    }

    KingfisherRule {
        name: rule.meta.name.clone(),
        id: rule.id.clone(),
        pattern: compose_match(&rule.target),
        min_entropy: min_entropy(rule),
        confidence: rule.meta.confidence,
        examples: rule
            .meta
            .examples
            .as_ref()
            .and_then(|examples| examples.positive.clone()),
        references: rule.meta.references.clone(),
        visible: rule.meta.report,
        depends_on_rule: depends_on_rule(rule),
        validation: validation(rule, warnings),
    }
}

/// Lower every rule into the kingfisher rules document
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
