//! Backend emitters
//!
//! One module per secret-scanning tool. Each lowers the full rule list
//! into that tool's document dialect, independently of the others: rules
//! are lowered one at a time, in document order, and never mutated.

pub mod common;
pub mod github;
pub mod gitleaks;
pub mod kingfisher;
pub mod noseyparker;
pub mod trufflehog;

use std::fmt;

use crate::diagnostics::Warning;
use crate::emit::{self, EmitError};
use crate::schema::Rule;

/// The supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Github,
    Gitleaks,
    Kingfisher,
    Noseyparker,
    Trufflehog,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::Github,
        Backend::Gitleaks,
        Backend::Kingfisher,
        Backend::Noseyparker,
        Backend::Trufflehog,
    ];

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(Backend::Github),
            "gitleaks" => Some(Backend::Gitleaks),
            "kingfisher" => Some(Backend::Kingfisher),
            "noseyparker" => Some(Backend::Noseyparker),
            "trufflehog" => Some(Backend::Trufflehog),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Github => "github",
            Backend::Gitleaks => "gitleaks",
            Backend::Kingfisher => "kingfisher",
            Backend::Noseyparker => "noseyparker",
            Backend::Trufflehog => "trufflehog",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered document text plus everything lost while lowering
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Lower the rule list for one backend and serialize the document in the
/// backend's native text format
pub fn render(backend: Backend, rules: &[Rule]) -> Result<Rendered, EmitError> {
    match backend {
        Backend::Github => {
            let translation = github::translate(rules);
            Ok(Rendered {
                text: emit::to_json(&translation.document)?,
                warnings: translation.warnings,
            })
        }
        Backend::Gitleaks => {
            let translation = gitleaks::translate(rules);
            Ok(Rendered {
                text: emit::to_toml(&translation.document)?,
                warnings: translation.warnings,
            })
        }
        Backend::Kingfisher => {
            let translation = kingfisher::translate(rules);
            Ok(Rendered {
                text: emit::to_yaml(&translation.document)?,
                warnings: translation.warnings,
            })
        }
        Backend::Noseyparker => {
            let translation = noseyparker::translate(rules);
            Ok(Rendered {
                text: emit::to_yaml(&translation.document)?,
                warnings: translation.warnings,
            })
        }
        Backend::Trufflehog => {
            let translation = trufflehog::translate(rules);
            Ok(Rendered {
                text: emit::to_yaml(&translation.document)?,
                warnings: translation.warnings,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(Backend::from_str("gitleaks"), Some(Backend::Gitleaks));
        assert_eq!(Backend::from_str("GitHub"), Some(Backend::Github));
        assert_eq!(Backend::from_str("semgrep"), None);
    }

    #[test]
    fn test_backend_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(Backend::from_str(backend.as_str()), Some(backend));
        }
    }
}
