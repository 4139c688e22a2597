//! # Error Types

use thiserror::Error;

/// Error raised while generating or rendering a document.
#[derive(Error, Debug)]
pub enum OpenApiError {
    /// Two distinct DTOs would share one component name.
    #[error("two different DTOs are both named '{name}'; component names must be unique")]
    DuplicateSchemaName { name: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_message() {
        let err = OpenApiError::DuplicateSchemaName {
            name: "User".into(),
        };
        assert!(err.to_string().contains("'User'"));
    }

    #[test]
    fn wraps_serde_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(OpenApiError::from(json_err), OpenApiError::Json(_)));
    }
}
