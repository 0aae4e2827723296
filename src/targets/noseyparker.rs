//! nosey parker rules lowering
//!
//! The simplest target: a composed pattern plus documentation. Filters,
//! dependencies, and analyzers have no representation at all; each is
//! dropped with its own warning.

use serde::Serialize;

use crate::diagnostics::{Translation, Warning, WarningKind};
use crate::pattern::{compose_match, Pattern};
use crate::schema::{HttpUrl, Rule, RuleId};

/// One lowered rule
#[derive(Debug, Serialize)]
pub struct NoseyparkerRule {
    pub name: String,
    pub id: RuleId,
    pub pattern: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_examples: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<HttpUrl>>,
}

/// The complete nosey parker rules document
#[derive(Debug, Serialize)]
pub struct Config {
    pub rules: Vec<NoseyparkerRule>,
}

fn lower(rule: &Rule, warnings: &mut Vec<Warning>) -> NoseyparkerRule {
    if !rule.dependencies().is_empty() {
        warnings.push(Warning::new(
            rule.id.clone(),
            WarningKind::DependenciesIgnored,
        ));
    }
    if !rule.filters().is_empty() {
        warnings.push(Warning::new(rule.id.clone(), WarningKind::FiltersIgnored));
    }
    if !rule.analyzers().is_empty() {
        warnings.push(Warning::new(rule.id.clone(), WarningKind::AnalyzersIgnored));
    }

    NoseyparkerRule {
        name: rule.meta.name.clone(),
        id: rule.id.clone(),
        pattern: compose_match(&rule.target),
        examples: rule
            .meta
            .examples
            .as_ref()
            .and_then(|examples| examples.positive.clone()),
        negative_examples: rule
            .meta
            .examples
            .as_ref()
            .and_then(|examples| examples.negative.clone()),
        categories: rule.meta.tags.clone(),
        description: rule.meta.description.clone(),
        references: rule.meta.references.clone(),
    }
}

/// Lower every rule into the nosey parker rules document
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
