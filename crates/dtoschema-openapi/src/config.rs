//! # Generator Configuration
//!
//! Document-level metadata. Usually kept next to the application's other
//! settings and loaded from YAML:
//!
//! ```yaml
//! title: Catalog API
//! version: 2.1.0
//! description: Products and inventory
//! servers:
//!   - url: https://api.example.com
//! ```

use serde::{Deserialize, Serialize};

use crate::error::OpenApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenApiConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub servers: Vec<Server>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            servers: Vec::new(),
        }
    }
}

impl OpenApiConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    /// # Errors
    ///
    /// Returns [`OpenApiError::Yaml`] if the text is not a valid config.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, OpenApiError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// # Errors
    ///
    /// Returns [`OpenApiError::Json`] if the text is not a valid config.
    pub fn from_json_str(json: &str) -> Result<Self, OpenApiError> {
        Ok(serde_json::from_str(json)?)
    }
}
