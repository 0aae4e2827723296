//! The rule schema
//!
//! The validated, tool-agnostic representation every backend is lowered
//! from. Shape invariants are enforced while a document deserializes, so
//! an invalid document can never become a `RuleSet` and emitters only
//! ever see valid values. Validation is atomic: one bad rule rejects the
//! whole document.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::pattern::Pattern;

/// A value that violates a schema invariant
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid rule id {0:?}: expected \"S3IG\" followed by 16 characters from A-Z and 2-7")]
    InvalidRuleId(String),

    #[error("invalid variable name {0:?}: expected lowercase letters, digits and underscores, starting with a letter")]
    InvalidVariableName(String),

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid url {0:?}: expected an http or https url")]
    InvalidUrl(String),

    #[error("invalid status range [{0}, {1}]: the first value must be smaller")]
    InvalidStatusRange(u16, u16),

    #[error("field {field:?} is not allowed when filter kind is {kind}")]
    IllegalFilterField {
        field: &'static str,
        kind: FilterKind,
    },
}

/// Failure to load a rules document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read rules file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_yaml::Error),
}

static RULE_ID: Lazy<Regex> = Lazy::new(|| Regex::new("^S3IG[A-Z2-7]{16}$").unwrap());
static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z](?:[a-z0-9_]*[a-z0-9])?$").unwrap());

/// A rule identifier: the constant `S3IG` tag plus 16 base32 characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(raw: impl Into<String>) -> Result<Self, SchemaError> {
        let raw = raw.into();
        if !RULE_ID.is_match(&raw) {
            return Err(SchemaError::InvalidRuleId(raw));
        }
        Ok(RuleId(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RuleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RuleId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// The name of a template variable a dependent rule's match binds to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableName(String);

impl VariableName {
    pub fn new(raw: impl Into<String>) -> Result<Self, SchemaError> {
        let raw = raw.into();
        if !VARIABLE_NAME.is_match(&raw) {
            return Err(SchemaError::InvalidVariableName(raw));
        }
        Ok(VariableName(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VariableName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        VariableName::new(raw).map_err(serde::de::Error::custom)
    }
}

/// An http(s) url, kept byte-for-byte as written.
///
/// Urls may embed template expressions, so nothing beyond the scheme is
/// parsed or normalized; a url parser would percent-encode the template
/// syntax away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HttpUrl(String);

impl HttpUrl {
    pub fn new(raw: impl Into<String>) -> Result<Self, SchemaError> {
        let raw = raw.into();
        let rest = raw
            .strip_prefix("http://")
            .or_else(|| raw.strip_prefix("https://"));
        match rest {
            Some(rest) if !rest.is_empty() => Ok(HttpUrl(raw)),
            _ => Err(SchemaError::InvalidUrl(raw)),
        }
    }

    pub fn scheme(&self) -> &str {
        if self.0.starts_with("https://") {
            "https"
        } else {
            "http"
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HttpUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HttpUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        HttpUrl::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Quality rating for a rule or analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected syntax of an http response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    Html,
    Json,
    Xml,
}

/// Classification of the value a rule matches.
///
/// Variant names follow the official name used by the issuing platform;
/// add variants as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// The default when unset
    #[default]
    Unknown,
    AwsAccessKeyId,
    AwsSecretAccessKey,
    GithubFineGrainedPersonalAccessToken,
    GithubPersonalAccessToken,
    Hostname,
    Password,
    Username,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Unknown => "unknown",
            TargetKind::AwsAccessKeyId => "aws_access_key_id",
            TargetKind::AwsSecretAccessKey => "aws_secret_access_key",
            TargetKind::GithubFineGrainedPersonalAccessToken => {
                "github_fine_grained_personal_access_token"
            }
            TargetKind::GithubPersonalAccessToken => "github_personal_access_token",
            TargetKind::Hostname => "hostname",
            TargetKind::Password => "password",
            TargetKind::Username => "username",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positive and negative example strings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Examples {
    pub positive: Option<Vec<String>>,
    pub negative: Option<Vec<String>>,
}

/// Classification and documentation for a rule
#[derive(Debug, Clone, Deserialize)]
pub struct RuleMeta {
    #[serde(default)]
    pub kind: TargetKind,
    pub name: String,
    pub description: Option<String>,
    pub confidence: Option<Confidence>,
    pub examples: Option<Examples>,
    pub references: Option<Vec<HttpUrl>>,
    /// Whether matches should be surfaced to an end user
    #[serde(default = "default_true")]
    pub report: bool,
    pub tags: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

/// The kind of live verification an analyzer performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Http,
}

impl AnalyzerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerKind::Http => "http",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a live-verification step
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerMeta {
    pub kind: AnalyzerKind,
    pub confidence: Option<Confidence>,
    pub examples: Option<Examples>,
    pub references: Option<Vec<HttpUrl>>,
    /// Whether the verification response should be surfaced in the report
    #[serde(default)]
    pub report: bool,
    pub tags: Option<Vec<String>>,
}

/// The value being matched
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub prefix_pattern: Option<Pattern>,
    pub pattern: Pattern,
    pub suffix_pattern: Option<Pattern>,
}

/// Discriminator for the two filter variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Require,
    Exclude,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Require => "require",
            FilterKind::Exclude => "exclude",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition a match must satisfy to count as a finding
#[derive(Debug, Clone)]
pub struct RequireFilter {
    pub target_strings: Option<Vec<String>>,
    pub path_patterns: Option<Vec<Pattern>>,
    pub path_strings: Option<Vec<String>>,
    pub context_strings: Option<Vec<String>>,
    /// Required lower bound on match entropy
    pub target_min_entropy: Option<f64>,
}

/// A condition that, when met, suppresses a match
#[derive(Debug, Clone)]
pub struct ExcludeFilter {
    pub target_strings: Option<Vec<String>>,
    pub path_patterns: Option<Vec<Pattern>>,
    pub path_strings: Option<Vec<String>>,
    pub context_strings: Option<Vec<String>>,
    pub target_patterns: Option<Vec<Pattern>>,
    pub match_patterns: Option<Vec<Pattern>>,
    pub match_strings: Option<Vec<String>>,
    pub context_patterns: Option<Vec<Pattern>>,
}

/// A match filter, tagged by whether it must or must not hold.
///
/// The discriminator fixes which fields are legal: the extra scopes only
/// exist on the EXCLUDE variant and the entropy bound only on REQUIRE, so
/// an illegal combination is rejected during deserialization and is not
/// constructible afterwards.
#[derive(Debug, Clone)]
pub enum Filter {
    Require(RequireFilter),
    Exclude(ExcludeFilter),
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Require(_) => FilterKind::Require,
            Filter::Exclude(_) => FilterKind::Exclude,
        }
    }

    /// Literal target strings, common to both kinds
    pub fn target_strings(&self) -> &[String] {
        let strings = match self {
            Filter::Require(f) => &f.target_strings,
            Filter::Exclude(f) => &f.target_strings,
        };
        strings.as_deref().unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            kind: FilterKind,
            target_strings: Option<Vec<String>>,
            path_patterns: Option<Vec<Pattern>>,
            path_strings: Option<Vec<String>>,
            context_strings: Option<Vec<String>>,
            #[serde(default, deserialize_with = "de_non_negative")]
            target_min_entropy: Option<f64>,
            target_patterns: Option<Vec<Pattern>>,
            match_patterns: Option<Vec<Pattern>>,
            match_strings: Option<Vec<String>>,
            context_patterns: Option<Vec<Pattern>>,
        }

        fn illegal<E: serde::de::Error>(field: &'static str, kind: FilterKind) -> E {
            E::custom(SchemaError::IllegalFilterField { field, kind })
        }

        let raw = Raw::deserialize(deserializer)?;
        match raw.kind {
            FilterKind::Require => {
                if raw.target_patterns.is_some() {
                    return Err(illegal("target_patterns", raw.kind));
                }
                if raw.match_patterns.is_some() {
                    return Err(illegal("match_patterns", raw.kind));
                }
                if raw.match_strings.is_some() {
                    return Err(illegal("match_strings", raw.kind));
                }
                if raw.context_patterns.is_some() {
                    return Err(illegal("context_patterns", raw.kind));
                }
                Ok(Filter::Require(RequireFilter {
                    target_strings: raw.target_strings,
                    path_patterns: raw.path_patterns,
                    path_strings: raw.path_strings,
                    context_strings: raw.context_strings,
                    target_min_entropy: raw.target_min_entropy,
                }))
            }
            FilterKind::Exclude => {
                if raw.target_min_entropy.is_some() {
                    return Err(illegal("target_min_entropy", raw.kind));
                }
                Ok(Filter::Exclude(ExcludeFilter {
                    target_strings: raw.target_strings,
                    path_patterns: raw.path_patterns,
                    path_strings: raw.path_strings,
                    context_strings: raw.context_strings,
                    target_patterns: raw.target_patterns,
                    match_patterns: raw.match_patterns,
                    match_strings: raw.match_strings,
                    context_patterns: raw.context_patterns,
                }))
            }
        }
    }
}

/// Reject negative, NaN, and infinite bounds
fn de_non_negative<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    if let Some(v) = value {
        if !v.is_finite() || v < 0.0 {
            return Err(serde::de::Error::custom(
                "must be a non-negative, finite number",
            ));
        }
    }
    Ok(value)
}

/// A closed interval of http status codes.
///
/// Deserializes from a single integer (`404` covers exactly 404) or a
/// strictly-ordered `[low, high]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    start: u16,
    end: u16,
}

impl StatusRange {
    pub fn new(start: u16, end: u16) -> Result<Self, SchemaError> {
        if start >= end {
            return Err(SchemaError::InvalidStatusRange(start, end));
        }
        Ok(StatusRange { start, end })
    }

    pub fn single(code: u16) -> Self {
        StatusRange {
            start: code,
            end: code,
        }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Every status code the range covers
    pub fn expand(&self) -> std::ops::RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl<'de> Deserialize<'de> for StatusRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Single(u16),
            Pair(Vec<u16>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Single(code) => Ok(StatusRange::single(code)),
            Raw::Pair(values) => {
                if values.len() != 2 {
                    return Err(serde::de::Error::custom(format!(
                        "status range must contain two values, got {}",
                        values.len()
                    )));
                }
                StatusRange::new(values[0], values[1]).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// One ANDed condition over an http response
#[derive(Debug, Clone, Deserialize)]
pub struct HttpMatcher {
    pub statuses: Option<Vec<StatusRange>>,
    pub headers: Option<BTreeMap<String, Vec<String>>>,
    pub body_strings: Option<Vec<String>>,
    pub body_patterns: Option<Vec<Pattern>>,
    pub body_syntax: Option<Syntax>,
}

/// The http request an analyzer performs
#[derive(Debug, Clone, Deserialize)]
pub struct HttpAction {
    pub url: HttpUrl,
    pub method: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<String>,
    /// Request timeout in seconds; no backend can express this
    #[serde(default, deserialize_with = "de_non_negative")]
    pub timeout: Option<f64>,
}

/// An optional live-verification step attached to a rule
#[derive(Debug, Clone, Deserialize)]
pub struct Analyzer {
    pub meta: AnalyzerMeta,
    pub action: HttpAction,
    /// Matchers over the response, all of which must hold
    pub condition: Vec<HttpMatcher>,
}

/// A reference to another rule whose nearby match this rule requires
#[derive(Debug, Clone, Deserialize)]
pub struct Dependency {
    pub rule_id: RuleId,
    /// Template variable the referenced rule's match binds to
    pub varname: VariableName,
    pub within_lines: Option<u32>,
    pub within_columns: Option<u32>,
}

/// A single secret-detection rule, immutable once loaded
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub meta: RuleMeta,
    pub dependencies: Option<Vec<Dependency>>,
    pub target: Target,
    pub filters: Option<Vec<Filter>>,
    pub analyzers: Option<Vec<Analyzer>>,
}

impl Rule {
    /// The rule's filters, empty when none were declared
    pub fn filters(&self) -> &[Filter] {
        self.filters.as_deref().unwrap_or_default()
    }

    /// The rule's dependencies, empty when none were declared
    pub fn dependencies(&self) -> &[Dependency] {
        self.dependencies.as_deref().unwrap_or_default()
    }

    /// The rule's analyzers, empty when none were declared
    pub fn analyzers(&self) -> &[Analyzer] {
        self.analyzers.as_deref().unwrap_or_default()
    }
}

/// A complete rules document
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse and validate a yaml rules document.
    ///
    /// Validation is atomic: one invalid rule rejects the whole document
    /// and nothing is translated.
    pub fn from_yaml(text: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a rules document from a file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}
