//! sssig-translate - compile secret-detection rules for multiple scanners
//!
//! This library lowers a tool-agnostic secret-detection rule document
//! into the native configuration dialect of one of several scanning
//! backends.
//!
//! # Features
//!
//! - **One source of truth**: rules are authored once, in a validated IR
//! - **Five backends**: github, gitleaks, kingfisher, nosey parker, trufflehog
//! - **Lossy by design**: what a backend cannot express is dropped with a
//!   structured, testable warning, never silently misrepresented
//! - **Pattern algebra**: prefix/target/suffix composition and literal
//!   alternations with exact capture-group semantics
//!
//! # Example
//!
//! ```
//! use sssig_translate::{targets, Backend, RuleSet};
//!
//! let rules = RuleSet::from_yaml(r#"
//! rules:
//!   - id: S3IGABCDEFGHIJKLMNOP
//!     meta:
//!       name: Example token
//!     target:
//!       pattern: "[A-Za-z0-9]{32}"
//! "#).unwrap();
//!
//! let rendered = targets::render(Backend::Gitleaks, &rules.rules).unwrap();
//! assert!(rendered.text.contains("[A-Za-z0-9]{32}"));
//! assert!(rendered.warnings.is_empty());
//! ```

pub mod diagnostics;
pub mod emit;
pub mod pattern;
pub mod schema;
pub mod targets;
pub mod template;

// Re-exports for convenience
pub use diagnostics::{Translation, Warning, WarningKind};
pub use pattern::Pattern;
pub use schema::{LoadError, Rule, RuleSet, SchemaError};
pub use targets::{Backend, Rendered};
