//! Configuration types for drizzle-indexes.toml

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::ParseErrorPolicy;
use crate::error::ConfigError;
use crate::parser::ParserOptions;

/// Database connection configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Schema used for unqualified table names. `None` defers to the
    /// server's `search_path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Parser-specific configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// Functions recognized as the lower-casing idiom
    #[serde(default = "default_lower_functions")]
    pub lower_functions: Vec<String>,
    /// Keep the catalog's unique flag on expression indexes
    #[serde(default = "default_true")]
    pub trust_expression_unique: bool,
    /// `collect` or `abort`
    #[serde(default)]
    pub on_parse_error: ParseErrorPolicy,
}

fn default_lower_functions() -> Vec<String> {
    vec!["lower".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            lower_functions: default_lower_functions(),
            trust_expression_unique: true,
            on_parse_error: ParseErrorPolicy::default(),
        }
    }
}

/// Main configuration struct for drizzle-indexes.toml
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct IntrospectConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

impl IntrospectConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.parser.lower_functions.is_empty() {
            return Err(ConfigError::ParseError(
                "parser.lower_functions must name at least one function".to_string(),
            ));
        }
        if let Some(bad) = self
            .parser
            .lower_functions
            .iter()
            .find(|f| f.is_empty() || !f.chars().all(|c| c.is_alphanumeric() || c == '_'))
        {
            return Err(ConfigError::ParseError(format!(
                "parser.lower_functions: '{}' is not a function name",
                bad
            )));
        }
        Ok(())
    }

    /// Parser options described by this configuration
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            lower_functions: self.parser.lower_functions.clone(),
            trust_expression_unique: self.parser.trust_expression_unique,
        }
    }
}
