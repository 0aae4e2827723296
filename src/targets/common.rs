//! Query helpers shared by the backend emitters
//!
//! Derive cross-cutting values from a rule: filter partitions, the
//! aggregate entropy bound, and keyword strings.

use crate::schema::{ExcludeFilter, Filter, RequireFilter, Rule};

/// A rule's REQUIRE filters, in declaration order
pub fn required_filters(rule: &Rule) -> Vec<&RequireFilter> {
    rule.filters()
        .iter()
        .filter_map(|filter| match filter {
            Filter::Require(f) => Some(f),
            Filter::Exclude(_) => None,
        })
        .collect()
}

/// A rule's EXCLUDE filters, in declaration order
pub fn excluded_filters(rule: &Rule) -> Vec<&ExcludeFilter> {
    rule.filters()
        .iter()
        .filter_map(|filter| match filter {
            Filter::Require(_) => None,
            Filter::Exclude(f) => Some(f),
        })
        .collect()
}

/// Aggregate entropy bound: the largest bound any REQUIRE filter
/// declares.
///
/// Absence, not zero, signals "no constraint": None when there are no
/// REQUIRE filters or none declares a positive bound.
pub fn min_entropy(rule: &Rule) -> Option<f64> {
    let filters = required_filters(rule);
    if filters.is_empty() {
        return None;
    }

    let mut entropy = 0.0_f64;
    for filter in filters {
        if let Some(bound) = filter.target_min_entropy {
            if bound > entropy {
                entropy = bound;
            }
        }
    }

    (entropy != 0.0).then_some(entropy)
}

/// Keyword strings: each REQUIRE filter's context strings followed by its
/// literal target strings, in filter order
pub fn keywords(rule: &Rule) -> Option<Vec<String>> {
    let filters = required_filters(rule);
    if filters.is_empty() {
        return None;
    }

    let mut keywords = Vec::new();
    for filter in filters {
        if let Some(strings) = &filter.context_strings {
            keywords.extend(strings.iter().cloned());
        }
        if let Some(strings) = &filter.target_strings {
            keywords.extend(strings.iter().cloned());
        }
    }

    (!keywords.is_empty()).then_some(keywords)
}
