//! Structured document tags (`w:sdt`) at body level
//!
//! Content controls and building blocks such as a table of contents are
//! wrapped in an sdt whose content is itself a sequence of body elements.

use super::BodyElement;

/// `w:sdtPr`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdtProperties {
    pub id: Option<i64>,
    pub alias: Option<String>,
    pub tag: Option<String>,
    /// `w:docPartObj/w:docPartGallery`, e.g. `Table of Contents`
    pub doc_part_gallery: Option<String>,
    pub doc_part_unique: bool,
}

/// A block-level structured document tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredTag {
    pub properties: SdtProperties,
    pub content: Vec<BodyElement>,
}

impl StructuredTag {
    pub fn new(properties: SdtProperties) -> Self {
        Self {
            properties,
            content: Vec::new(),
        }
    }

    /// Build a doc-part wrapper such as the one Word uses for a table of contents
    pub fn doc_part(id: i64, gallery: impl Into<String>) -> Self {
        Self::new(SdtProperties {
            id: Some(id),
            doc_part_gallery: Some(gallery.into()),
            doc_part_unique: true,
            ..SdtProperties::default()
        })
    }

    pub fn push(&mut self, element: impl Into<BodyElement>) {
        self.content.push(element.into());
    }
}
