//! End-to-end translation tests: yaml rule documents in, rendered
//! backend text out

use sssig_translate::{targets, Backend, RuleSet, WarningKind};

fn render(backend: Backend, doc: &str) -> targets::Rendered {
    let ruleset = RuleSet::from_yaml(doc).unwrap();
    targets::render(backend, &ruleset.rules).unwrap()
}

// ============================================================================
// gitleaks
// ============================================================================

#[test]
fn test_gitleaks_keyword_entropy_rule() {
    let rendered = render(
        Backend::Gitleaks,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Example token
    target:
      pattern: "[A-Za-z0-9]{32}"
    filters:
      - kind: require
        target_min_entropy: 3.0
        context_strings: [api_key]
"#,
    );

    assert!(rendered.text.contains("[[rules]]"));
    assert!(rendered.text.contains(r#"regex = "[A-Za-z0-9]{32}""#));
    assert!(rendered.text.contains("entropy = 3.0"));
    assert!(rendered.text.contains(r#"keywords = ["api_key"]"#));
    // A REQUIRE-only filter yields no allowlist
    assert!(!rendered.text.contains("allowlists"));
    assert!(rendered.warnings.is_empty());
}

#[test]
fn test_gitleaks_allowlist_rendering() {
    let rendered = render(
        Backend::Gitleaks,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Example token
    target:
      pattern: "[A-Za-z0-9]{32}"
    filters:
      - kind: exclude
        target_strings: [EXAMPLE]
        context_strings: [x]
        match_patterns: ["y+"]
"#,
    );

    assert!(rendered.text.contains("[[rules.allowlists]]"));
    assert!(rendered.text.contains(r#"condition = "and""#));
    assert!(rendered.text.contains(r#"regexTarget = "line""#));
    assert!(rendered.text.contains(r#"stopwords = ["EXAMPLE"]"#));
    // Both the context literal and the folded match pattern survive
    assert!(rendered.text.contains("(?i)x"));
    assert!(rendered.text.contains("y+"));

    assert_eq!(rendered.warnings.len(), 1);
    assert_eq!(
        rendered.warnings[0].kind,
        WarningKind::ScopeFolded {
            scope: "match",
            regex_target: "line",
        }
    );
}

#[test]
fn test_gitleaks_skip_report_and_tags() {
    let rendered = render(
        Backend::Gitleaks,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      kind: password
      name: Example password
      confidence: low
      report: false
    target:
      pattern: "[A-Za-z0-9]{32}"
"#,
    );

    assert!(rendered.text.contains("skipReport = true"));
    assert!(rendered.text.contains(r#"tags = ["kind:password", "confidence:low"]"#));
}

// ============================================================================
// github
// ============================================================================

#[test]
fn test_github_pattern_parts_and_post_processing() {
    let rendered = render(
        Backend::Github,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Example token
    target:
      prefix_pattern: "key="
      pattern: "[A-Z]{16}"
      suffix_pattern: "\\b"
    filters:
      - kind: require
        target_strings: [prod]
      - kind: exclude
        target_patterns: ["test.*"]
"#,
    );

    assert!(rendered.text.contains(r#""secret_format": "[A-Z]{16}""#));
    assert!(rendered.text.contains(r#""before_secret": "key=""#));
    assert!(rendered.text.contains(r#""after_secret": "\\b""#));
    assert!(rendered.text.contains(r#""post_processing_rule_0": "must_match""#));
    assert!(rendered.text.contains(r#""post_processing_rule_1": "must_not_match""#));
    assert!(rendered.warnings.is_empty());
}

#[test]
fn test_github_empty_filter_skipped_with_warning() {
    let rendered = render(
        Backend::Github,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Example token
    target:
      pattern: "[A-Z]{16}"
    filters:
      - kind: require
        path_patterns: ["\\.tf$"]
"#,
    );

    assert!(!rendered.text.contains("post_processing_0"));
    assert_eq!(rendered.warnings.len(), 1);
    assert_eq!(rendered.warnings[0].kind, WarningKind::EmptyFilter { index: 0 });
    assert_eq!(rendered.warnings[0].rule_id.as_str(), "S3IGABCDEFGHIJKLMNOP");
}

// ============================================================================
// kingfisher
// ============================================================================

#[test]
fn test_kingfisher_validation_rendering() {
    let rendered = render(
        Backend::Kingfisher,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Verified token
    target:
      pattern: "[A-Z]{16}"
    analyzers:
      - meta:
          kind: http
          report: true
        action:
          url: "https://api.example.com/check?key={{ target }}"
          method: post
        condition:
          - statuses: [200, [401, 403]]
"#,
    );

    assert!(rendered.text.contains("type: Http"));
    assert!(rendered.text.contains("method: POST"));
    // The match variable is renamed for kingfisher's templates
    assert!(rendered.text.contains("key={{ TOKEN }}"));
    assert!(rendered.text.contains("type: StatusMatch"));
    assert!(rendered.text.contains("type: ReportResponse"));
    assert!(rendered.warnings.is_empty());
}

#[test]
fn test_kingfisher_drops_filters_and_extra_analyzers() {
    let rendered = render(
        Backend::Kingfisher,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Verified token
    target:
      pattern: "[A-Z]{16}"
    filters:
      - kind: exclude
        target_strings: [EXAMPLE]
    analyzers:
      - meta:
          kind: http
        action:
          url: "https://api.example.com/check"
        condition: []
      - meta:
          kind: http
        action:
          url: "https://api.example.com/fallback"
        condition: []
"#,
    );

    let kinds: Vec<&WarningKind> = rendered.warnings.iter().map(|w| &w.kind).collect();
    assert!(kinds.contains(&&WarningKind::FiltersIgnored));
    assert!(kinds.contains(&&WarningKind::UnmappedAnalyzers { count: 1 }));
    // Only the first analyzer's url appears
    assert!(rendered.text.contains("https://api.example.com/check"));
    assert!(!rendered.text.contains("fallback"));
}

// ============================================================================
// nosey parker
// ============================================================================

#[test]
fn test_noseyparker_simplest_lowering() {
    let rendered = render(
        Backend::Noseyparker,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Example token
      description: A demo token
      tags: [demo]
    target:
      prefix_pattern: "tok_"
      pattern: "[A-Z]{16}"
"#,
    );

    assert!(rendered.text.contains("pattern: (?:tok_)([A-Z]{16})"));
    assert!(rendered.text.contains("description: A demo token"));
    assert!(rendered.text.contains("categories:"));
    assert!(rendered.text.contains("- demo"));
    assert!(rendered.warnings.is_empty());
}

#[test]
fn test_noseyparker_drops_everything_extra() {
    let rendered = render(
        Backend::Noseyparker,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Loaded rule
    target:
      pattern: "[A-Z]{16}"
    dependencies:
      - rule_id: S3IGQRSTUVWXYZ234567
        varname: username
    filters:
      - kind: require
        context_strings: [api_key]
    analyzers:
      - meta:
          kind: http
        action:
          url: "https://api.example.com/check"
        condition: []
"#,
    );

    let kinds: Vec<&WarningKind> = rendered.warnings.iter().map(|w| &w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            &WarningKind::DependenciesIgnored,
            &WarningKind::FiltersIgnored,
            &WarningKind::AnalyzersIgnored,
        ]
    );
}

// ============================================================================
// trufflehog
// ============================================================================

#[test]
fn test_trufflehog_detector_rendering() {
    let rendered = render(
        Backend::Trufflehog,
        r#"
rules:
  - id: S3IGABCDEFGHIJKLMNOP
    meta:
      name: Example token
    target:
      pattern: "[A-Z]{16}"
    filters:
      - kind: require
        target_min_entropy: 2.5
        context_strings: [api_key]
      - kind: exclude
        target_strings: [EXAMPLE]
    analyzers:
      - meta:
          kind: http
        action:
          url: "http://api.example.com/check"
        condition: []
"#,
    );

    assert!(rendered.text.contains("detectors:"));
    assert!(rendered.text.contains("name: S3IGABCDEFGHIJKLMNOP"));
    assert!(rendered.text.contains("target: '[A-Z]{16}'"));
    assert!(rendered.text.contains("entropy: 2.5"));
    assert!(rendered.text.contains("- EXAMPLE"));
    // Plain-http endpoints are marked unsafe
    assert!(rendered.text.contains("unsafe: true"));
    assert!(rendered.warnings.is_empty());
}

// ============================================================================
// cross-backend behavior
// ============================================================================

#[test]
fn test_rule_order_is_preserved() {
    let doc = r#"
rules:
  - id: S3IGAAAAAAAAAAAAAAAA
    meta:
      name: First
    target:
      pattern: "first[0-9]+"
  - id: S3IGBBBBBBBBBBBBBBBB
    meta:
      name: Second
    target:
      pattern: "second[0-9]+"
"#;
    for backend in Backend::ALL {
        let rendered = render(backend, doc);
        let first = rendered.text.find("first[0-9]+").unwrap();
        let second = rendered.text.find("second[0-9]+").unwrap();
        assert!(first < second, "{} reordered rules", backend);
    }
}

#[test]
fn test_warnings_do_not_stop_translation() {
    let doc = r#"
rules:
  - id: S3IGAAAAAAAAAAAAAAAA
    meta:
      name: Loaded rule
    target:
      pattern: "first[0-9]+"
    analyzers:
      - meta:
          kind: http
        action:
          url: "https://api.example.com/check"
        condition: []
  - id: S3IGBBBBBBBBBBBBBBBB
    meta:
      name: Plain rule
    target:
      pattern: "second[0-9]+"
"#;
    let rendered = render(Backend::Noseyparker, doc);
    assert_eq!(rendered.warnings.len(), 1);
    assert_eq!(rendered.warnings[0].rule_id.as_str(), "S3IGAAAAAAAAAAAAAAAA");
    // The second rule still translated
    assert!(rendered.text.contains("second[0-9]+"));
}

#[test]
fn test_invalid_document_translates_nothing() {
    let doc = r#"
rules:
  - id: S3IGAAAAAAAAAAAAAAAA
    meta:
      name: Fine
    target:
      pattern: "ok[0-9]+"
  - id: not-a-rule-id
    meta:
      name: Broken
    target:
      pattern: "ok[0-9]+"
"#;
    assert!(RuleSet::from_yaml(doc).is_err());
}
