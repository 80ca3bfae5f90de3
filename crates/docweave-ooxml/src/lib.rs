//! # docweave-ooxml
//!
//! OOXML (Office Open XML) package handling and document model for docweave.
//!
//! This crate provides:
//! - a package store over the parts of a DOCX/DOTX archive
//! - per-document identifier allocation
//! - an ordered, typed model of the document body with its own parser and
//!   serializer
//!
//! ## Example: Editing a Document
//!
//! ```no_run
//! use docweave_ooxml::{Document, TextFormat};
//!
//! let mut doc = Document::open("report.docx")?;
//! doc.add_heading("Appendix", 1);
//! doc.add_formatted_paragraph(
//!     "Generated",
//!     &TextFormat { italic: true, ..TextFormat::default() },
//! );
//! doc.save("report-out.docx")?;
//! # Ok::<(), docweave_ooxml::OoxmlError>(())
//! ```

pub mod content_types;
pub mod document;
pub mod error;
pub mod ids;
pub mod model;
pub mod package;
pub mod relationships;
pub mod test_utils;
mod xml;

pub use content_types::ContentTypes;
pub use document::{Document, OpenBookmark, StyleCatalog};
pub use error::{OoxmlError, Result, ResultExt};
pub use ids::{IdAllocator, IdNamespace};
pub use model::{
    Alignment, Body, BodyElement, BookmarkEnd, BookmarkStart, BreakKind, Drawing, FieldCharKind,
    Hyperlink, Paragraph, ParagraphProperties, RawXml, Run, RunContent, RunProperties,
    SectionProperties, StructuredTag, Table, TableCell, TableRow, TextFormat,
};
pub use package::Package;
pub use relationships::{rel_types, Relationship, Relationships};
pub use xml::{escape_attr, escape_text};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
