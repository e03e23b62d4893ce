use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// CqrsConfig
///
/// Read-side settings, loaded from TOML. Every key is optional.
///
/// ```toml
/// model_data_collection_name = "model_data"
/// document_db_name = "cqrs_denormalized"
/// connection_uri = "mongodb://localhost"
/// document_id_key = "_id"
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CqrsConfig {
    /// Collection holding per-model bookkeeping documents.
    pub model_data_collection_name: String,
    /// Database the denormalized documents are written to.
    pub document_db_name: String,
    pub connection_uri: String,
    /// Key the `id` field is stored under in documents.
    pub document_id_key: String,

    /// Derive every serializer at startup.
    pub warm_up: bool,
}

impl Default for CqrsConfig {
    fn default() -> Self {
        Self {
            model_data_collection_name: "model_data".to_string(),
            document_db_name: "cqrs_denormalized".to_string(),
            connection_uri: "mongodb://localhost".to_string(),
            document_id_key: "_id".to_string(),
            warm_up: true,
        }
    }
}

impl CqrsConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_gives_defaults() {
        let config = CqrsConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, CqrsConfig::default());
        assert_eq!(config.document_id_key, "_id");
    }

    #[test]
    fn keys_override_defaults() {
        let config = CqrsConfig::from_toml_str(
            r#"
            document_db_name = "reads"
            document_id_key = "pk"
            warm_up = false
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.document_db_name, "reads");
        assert_eq!(config.document_id_key, "pk");
        assert!(!config.warm_up);
        assert_eq!(config.connection_uri, "mongodb://localhost");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CqrsConfig::from_toml_str("mongo_uri = \"x\"").expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CqrsConfig::from_path("/nonexistent/cqrs.toml").expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/cqrs.toml"));
    }
}
