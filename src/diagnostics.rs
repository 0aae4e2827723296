//! Structured translation warnings
//!
//! Lowering is lossy: a backend drops what it cannot express. Every drop,
//! fold, and skip is recorded as a value returned alongside the lowered
//! document, so callers and tests can see exactly what was lost instead
//! of scraping log text.

use std::fmt;

use crate::schema::{AnalyzerKind, RuleId};

/// What a backend dropped or approximated while lowering one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The backend has no representation for analyzers
    AnalyzersIgnored,

    /// The backend has no representation for filters
    FiltersIgnored,

    /// The backend has no representation for dependencies
    DependenciesIgnored,

    /// Analyzers beyond the first http analyzer were not mapped
    UnmappedAnalyzers { count: usize },

    /// The analyzer's request timeout has no equivalent
    TimeoutIgnored,

    /// The backend cannot verify with this analyzer kind
    UnsupportedAnalyzerKind { kind: AnalyzerKind },

    /// The filter at this position produced no usable pattern
    EmptyFilter { index: usize },

    /// A second pattern scope was folded into an already-chosen regex
    /// target, widening the exclusion
    ScopeFolded {
        scope: &'static str,
        regex_target: &'static str,
    },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::AnalyzersIgnored => {
                write!(f, "analyzers are not supported by this target and were dropped")
            }
            WarningKind::FiltersIgnored => {
                write!(f, "filters are not supported by this target and were dropped")
            }
            WarningKind::DependenciesIgnored => {
                write!(f, "dependencies are not supported by this target and were dropped")
            }
            WarningKind::UnmappedAnalyzers { count } => {
                write!(f, "{} analyzers not mapped", count)
            }
            WarningKind::TimeoutIgnored => write!(f, "http analyzer timeout ignored"),
            WarningKind::UnsupportedAnalyzerKind { kind } => {
                write!(f, "unsupported analyzer kind for verification: {}", kind)
            }
            WarningKind::EmptyFilter { index } => {
                write!(f, "filter {} produced no usable pattern and was skipped", index)
            }
            WarningKind::ScopeFolded {
                scope,
                regex_target,
            } => {
                write!(
                    f,
                    "applying {} patterns with a '{}' regex target",
                    scope, regex_target
                )
            }
        }
    }
}

/// A warning tied to the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub rule_id: RuleId,
    pub kind: WarningKind,
}

impl Warning {
    pub fn new(rule_id: RuleId, kind: WarningKind) -> Self {
        Warning { rule_id, kind }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}: {}", self.rule_id, self.kind)
    }
}

/// A lowered document together with everything lost while lowering it
#[derive(Debug, Clone)]
pub struct Translation<T> {
    pub document: T,
    pub warnings: Vec<Warning>,
}
