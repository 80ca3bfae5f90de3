//! Error types for template loading and rendering

use docweave_ooxml::OoxmlError;
use thiserror::Error;

/// Errors that can occur while loading, validating or rendering templates
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template with this name in the engine cache
    #[error("Template not found: {0}")]
    NotFound(String),

    /// The template chain defines no block with this name
    #[error("Block \"{block}\" not found in template {template}")]
    BlockNotFound { template: String, block: String },

    /// Template source failed syntax validation
    #[error("Validation error in {field}: {message} ({value})")]
    Validation {
        field: String,
        value: String,
        message: String,
    },

    /// Failure in the underlying document model
    #[error("Document error: {0}")]
    Document(#[from] OoxmlError),

    /// Template data could not be converted from or to JSON
    #[error("Data error: {0}")]
    Data(#[from] serde_json::Error),

    /// Engine configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Error reading files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A lower-level failure tagged with the operation that hit it
    #[error("template operation failed: {operation} ({context}): {source}")]
    Context {
        operation: &'static str,
        context: String,
        #[source]
        source: Box<TemplateError>,
    },
}

impl TemplateError {
    /// Build a validation error
    pub fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// The error underneath any `Context` wrappers
    pub fn root_cause(&self) -> &TemplateError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Attach an operation tag and context string to a failing result
pub trait ResultExt<T> {
    fn context(self, operation: &'static str, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<TemplateError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, operation: &'static str, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| TemplateError::Context {
            operation,
            context: context.into(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = TemplateError::validation("if_statements", "line 3", "unclosed {{#if}} tag");
        assert_eq!(
            err.to_string(),
            "Validation error in if_statements: unclosed {{#if}} tag (line 3)"
        );
    }

    #[test]
    fn test_context_wraps_document_error() {
        let res: std::result::Result<(), OoxmlError> =
            Err(OoxmlError::MissingPart("word/document.xml".to_string()));
        let err = res.context("render_to_document", "invoice").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("template operation failed: render_to_document (invoice)"));
        assert!(matches!(err.root_cause(), TemplateError::Document(_)));
    }
}
