//! Structured rendering of invocation results.
//!
//! Commands return JSON values; applications that print them pick a format
//! here. Both formats go straight through serde.

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during serialization.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Output format for structured results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Serializes data to the given format.
pub fn serialize<T: Serialize>(data: &T, format: OutputFormat) -> Result<String, SerializeError> {
    match format {
        OutputFormat::Json => to_json(data),
        OutputFormat::Yaml => to_yaml(data),
    }
}

/// Serializes data to pretty-printed JSON.
pub fn to_json<T: Serialize>(data: &T) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Serializes data to YAML.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String, SerializeError> {
    Ok(serde_yaml::to_string(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json() {
        let json = serialize(&json!({"title": "buy milk", "done": false}), OutputFormat::Json).unwrap();
        assert!(json.contains("\"title\": \"buy milk\""));
        assert!(json.contains("\"done\": false"));
    }

    #[test]
    fn test_to_yaml() {
        let yaml = serialize(&json!({"title": "buy milk"}), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("title: buy milk"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("yaml", true).unwrap(), OutputFormat::Yaml);
        assert!(OutputFormat::from_str("xml", true).is_err());
    }
}
