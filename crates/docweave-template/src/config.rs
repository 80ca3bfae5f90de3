//! Engine configuration
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! missing_variable = "empty"
//! paragraph_style = "BodyText"
//! keep_blank_lines = false
//! validate_on_load = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ResultExt};

/// What a placeholder with no matching data renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingVariable {
    /// Re-emit the placeholder text unchanged
    #[default]
    Keep,
    /// Drop the placeholder
    Empty,
}

/// Settings for a [`TemplateEngine`](crate::TemplateEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub missing_variable: MissingVariable,
    /// Style id for paragraphs created by text-only renders
    pub paragraph_style: Option<String>,
    /// Keep blank lines of text-only renders as empty paragraphs
    pub keep_blank_lines: bool,
    /// Run syntax validation when a template is loaded
    pub validate_on_load: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_variable: MissingVariable::Keep,
            paragraph_style: None,
            keep_blank_lines: true,
            validate_on_load: false,
        }
    }
}

impl EngineConfig {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).context("read_config", path.display().to_string())?;
        Self::from_toml_str(&text).context("parse_config", path.display().to_string())
    }
}
