//! The document body model
//!
//! A body is an ordered sequence of [`BodyElement`]s. Every element kind is
//! its own type and the sequence is matched exhaustively when it is written
//! back, which is where the one ordering rule of a body lives: the final
//! section properties always come last.

mod paragraph;
mod parse;
mod run;
mod sdt;
mod section;
mod serialize;
mod table;

pub use paragraph::{Alignment, Indentation, NumberingRef, Paragraph, ParagraphProperties, Spacing};
pub use parse::{parse_document_xml, ParsedDocument};
pub use run::{
    BreakKind, Drawing, FieldCharKind, Hyperlink, Run, RunContent, RunFonts, RunProperties, TextFormat,
    VerticalAlign,
};
pub use sdt::{SdtProperties, StructuredTag};
pub use section::{
    Columns, HeaderFooterKind, HeaderFooterRef, Orientation, PageMargins, PageNumbering, PageSize,
    SectionProperties,
};
pub use serialize::write_document_xml;
pub use table::{
    CellProperties, RowProperties, Table, TableCell, TableProperties, TableRow, VerticalMerge,
    Width, WidthUnit,
};

use crate::error::Result;

/// An XML fragment the model carries through without interpreting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawXml(pub String);

/// `w:bookmarkStart`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkStart {
    pub id: u32,
    pub name: String,
}

/// `w:bookmarkEnd`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookmarkEnd {
    pub id: u32,
}

/// One entry of a body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyElement {
    Paragraph(Paragraph),
    Table(Table),
    SectionProperties(SectionProperties),
    StructuredTag(StructuredTag),
    BookmarkStart(BookmarkStart),
    BookmarkEnd(BookmarkEnd),
}

impl From<Paragraph> for BodyElement {
    fn from(p: Paragraph) -> Self {
        BodyElement::Paragraph(p)
    }
}

impl From<Table> for BodyElement {
    fn from(t: Table) -> Self {
        BodyElement::Table(t)
    }
}

impl From<SectionProperties> for BodyElement {
    fn from(s: SectionProperties) -> Self {
        BodyElement::SectionProperties(s)
    }
}

impl From<StructuredTag> for BodyElement {
    fn from(s: StructuredTag) -> Self {
        BodyElement::StructuredTag(s)
    }
}

/// The ordered content of `w:body`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub elements: Vec<BodyElement>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the body out of a complete `word/document.xml`
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Ok(parse_document_xml(xml, "word/document.xml")?.body)
    }

    /// Serialize to a `<w:body>` element
    ///
    /// Elements keep their order except section properties: only the last
    /// one inserted is written, and always at the end.
    pub fn to_xml(&self) -> Result<String> {
        let mut out = String::new();
        self.write_xml(&mut out)?;
        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element
    pub fn push(&mut self, element: impl Into<BodyElement>) {
        self.elements.push(element.into());
    }

    /// Insert an element before `index`, appending when out of range
    pub fn insert(&mut self, index: usize, element: impl Into<BodyElement>) {
        let index = index.min(self.elements.len());
        self.elements.insert(index, element.into());
    }

    pub fn remove(&mut self, index: usize) -> Option<BodyElement> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    /// Top-level paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.elements.iter_mut().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Top-level tables
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.elements.iter().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.elements.iter_mut().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
    }

    /// The section properties that will be written, i.e. the last inserted
    pub fn section_properties(&self) -> Option<&SectionProperties> {
        self.elements.iter().rev().find_map(|e| match e {
            BodyElement::SectionProperties(s) => Some(s),
            _ => None,
        })
    }

    /// Replace every section properties element with `section`
    pub fn set_section_properties(&mut self, section: SectionProperties) {
        self.elements
            .retain(|e| !matches!(e, BodyElement::SectionProperties(_)));
        self.elements.push(BodyElement::SectionProperties(section));
    }

    /// Text of every paragraph in reading order, tables and tags included
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        collect_text(&self.elements, &mut lines);
        lines.join("\n")
    }
}

fn collect_text(elements: &[BodyElement], lines: &mut Vec<String>) {
    for element in elements {
        match element {
            BodyElement::Paragraph(p) => lines.push(p.text()),
            BodyElement::Table(t) => lines.extend(t.paragraphs().map(Paragraph::text)),
            BodyElement::StructuredTag(sdt) => collect_text(&sdt.content, lines),
            BodyElement::SectionProperties(_)
            | BodyElement::BookmarkStart(_)
            | BodyElement::BookmarkEnd(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_clamps() {
        let mut body = Body::new();
        body.push(Paragraph::with_text("a"));
        body.insert(0, Paragraph::with_text("first"));
        body.insert(99, Paragraph::with_text("last"));
        let texts: Vec<String> = body.paragraphs().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["first", "a", "last"]);
    }

    #[test]
    fn test_last_section_wins() {
        let mut body = Body::new();
        body.push(SectionProperties::a4());
        body.push(Paragraph::with_text("a"));
        let mut landscape = SectionProperties::a4();
        landscape.set_landscape();
        body.push(landscape.clone());
        assert_eq!(body.section_properties(), Some(&landscape));

        body.set_section_properties(SectionProperties::default());
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_plain_text_walks_tables_and_tags() {
        let mut body = Body::new();
        body.push(Paragraph::with_text("intro"));
        let mut table = Table::new(0, 1);
        table.append_row(["cell"]);
        body.push(table);
        let mut sdt = StructuredTag::doc_part(1, "Table of Contents");
        sdt.push(Paragraph::with_text("toc"));
        body.push(sdt);
        assert_eq!(body.plain_text(), "intro\ncell\ntoc");
    }
}
