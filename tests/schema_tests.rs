//! Integration tests for rules document loading and validation

use sssig_translate::RuleSet;

fn load(doc: &str) -> Result<RuleSet, sssig_translate::LoadError> {
    RuleSet::from_yaml(doc)
}

fn wrap_rule(rule_yaml: &str) -> String {
    format!("rules:\n{}", rule_yaml)
}

// ============================================================================
// Structural validation is fatal and atomic
// ============================================================================

#[test]
fn test_bad_rule_id_rejected() {
    let doc = wrap_rule(
        r#"  - id: RULE123
    meta:
      name: Bad id
    target:
      pattern: "[A-Z]{16}"
"#,
    );
    let err = load(&doc).unwrap_err();
    assert!(err.to_string().contains("invalid rule id"));
}

#[test]
fn test_invalid_pattern_rejected() {
    let doc = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Bad pattern
    target:
      pattern: "[unclosed"
"#,
    );
    let err = load(&doc).unwrap_err();
    assert!(err.to_string().contains("invalid pattern"));
}

#[test]
fn test_invalid_affix_pattern_rejected() {
    let doc = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Bad prefix
    target:
      prefix_pattern: "(?P<broken"
      pattern: "[A-Z]{16}"
"#,
    );
    assert!(load(&doc).is_err());
}

#[test]
fn test_backwards_status_range_rejected() {
    let doc = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Bad range
    target:
      pattern: "[A-Z]{16}"
    analyzers:
      - meta:
          kind: http
        action:
          url: "https://api.example.com/check"
        condition:
          - statuses: [[299, 200]]
"#,
    );
    assert!(load(&doc).is_err());
}

#[test]
fn test_filter_field_legality_is_kind_dependent() {
    let require_with_exclude_field = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Bad filter
    target:
      pattern: "[A-Z]{16}"
    filters:
      - kind: require
        match_strings: [nope]
"#,
    );
    let err = load(&require_with_exclude_field).unwrap_err();
    assert!(err.to_string().contains("match_strings"));

    let exclude_with_entropy = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Bad filter
    target:
      pattern: "[A-Z]{16}"
    filters:
      - kind: exclude
        target_min_entropy: 2.0
"#,
    );
    assert!(load(&exclude_with_entropy).is_err());
}

#[test]
fn test_unknown_filter_field_rejected() {
    let doc = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Typo filter
    target:
      pattern: "[A-Z]{16}"
    filters:
      - kind: require
        target_strigns: [oops]
"#,
    );
    assert!(load(&doc).is_err());
}

#[test]
fn test_one_bad_rule_rejects_the_document() {
    let doc = r#"
rules:
  - id: S3IGAAAAAAAAAAAAAAAA
    meta:
      name: Fine
    target:
      pattern: "[A-Z]{16}"
  - id: S3IGBBBBBBBBBBBBBBBB
    meta:
      name: Broken
    target:
      pattern: "[broken"
"#;
    assert!(load(doc).is_err());
}

#[test]
fn test_non_http_url_rejected() {
    let doc = wrap_rule(
        r#"  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Bad url
    target:
      pattern: "[A-Z]{16}"
    analyzers:
      - meta:
          kind: http
        action:
          url: "ftp://example.com/check"
        condition: []
"#,
    );
    let err = load(&doc).unwrap_err();
    assert!(err.to_string().contains("invalid url"));
}

// ============================================================================
// File loading
// ============================================================================

#[test]
fn test_load_from_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: From disk
    target:
      pattern: "[A-Z]{{16}}"
"#
    )
    .unwrap();

    let ruleset = RuleSet::from_file(file.path()).unwrap();
    assert_eq!(ruleset.rules.len(), 1);
    assert_eq!(ruleset.rules[0].meta.name, "From disk");
}

#[test]
fn test_load_missing_file_fails() {
    let err = RuleSet::from_file(std::path::Path::new("/no/such/rules.yml")).unwrap_err();
    assert!(err.to_string().contains("failed to read rules file"));
}
