//! Error types for OOXML operations

use thiserror::Error;

use crate::ids::IdNamespace;

/// Errors that can occur during OOXML operations
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML inside a named part
    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// Well-formed XML that does not describe a valid structure
    #[error("Invalid structure in {part}: {message}")]
    Structure { part: String, message: String },

    /// Required part not found in the package
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// Row or cell coordinates outside a table
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Every id of a namespace up to `u32::MAX` is in use
    #[error("No {0:?} ids left to allocate")]
    IdsExhausted(IdNamespace),

    /// The model holds a state that has no OOXML representation
    #[error("Cannot serialize: {0}")]
    Serialize(String),

    /// A lower-level failure tagged with the operation that hit it
    #[error("document operation failed: {operation} ({context}): {source}")]
    Context {
        operation: &'static str,
        context: String,
        #[source]
        source: Box<OoxmlError>,
    },
}

impl OoxmlError {
    /// Build an XML error for `part`
    pub fn xml(part: impl Into<String>, source: quick_xml::Error) -> Self {
        Self::Xml {
            part: part.into(),
            source,
        }
    }

    /// Build a structural error for `part`
    pub fn structure(part: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Structure {
            part: part.into(),
            message: message.into(),
        }
    }

    /// The error underneath any `Context` wrappers
    pub fn root_cause(&self) -> &OoxmlError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Attach an operation tag and context string to a failing result
pub trait ResultExt<T> {
    fn context(self, operation: &'static str, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<OoxmlError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, operation: &'static str, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| OoxmlError::Context {
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
    fn test_context_message() {
        let res: Result<()> = Err(OoxmlError::MissingPart("word/document.xml".to_string()));
        let err = res.context("open", "report.docx").unwrap_err();
        assert_eq!(
            err.to_string(),
            "document operation failed: open (report.docx): Required part not found: word/document.xml"
        );
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let inner: Result<()> = Err(OoxmlError::structure("word/document.xml", "no body"));
        let err = inner
            .context("parse", "word/document.xml")
            .context("open", "a.docx")
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            OoxmlError::Structure { part, .. } if part == "word/document.xml"
        ));
    }
}
