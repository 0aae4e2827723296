//! Serializer boundary
//!
//! Emitters return document values; these helpers render them as text.
//! Rendering is a plain function call with no process-wide configuration,
//! and unset optional fields are omitted rather than serialized as null.

use serde::Serialize;

/// Failure in one of the underlying text serializers
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml serialization failed: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("yaml serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Render a document as pretty-printed json
pub fn to_json<T: Serialize>(document: &T) -> Result<String, EmitError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Render a document as toml
pub fn to_toml<T: Serialize>(document: &T) -> Result<String, EmitError> {
    Ok(toml::to_string(document)?)
}

/// Render a document as yaml
pub fn to_yaml<T: Serialize>(document: &T) -> Result<String, EmitError> {
    Ok(serde_yaml::to_string(document)?)
}
