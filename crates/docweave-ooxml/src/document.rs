//! The editable Word document
//!
//! A [`Document`] ties a [`Package`] to the parsed [`Body`] of its main part
//! and to the [`IdAllocator`] every feature module draws identifiers from.
//! The main part is regenerated from the body whenever the document is
//! written.
//!
//! ```
//! use docweave_ooxml::{Alignment, Document};
//!
//! let mut doc = Document::new();
//! doc.add_heading("Report", 1);
//! doc.add_paragraph("Summary").set_alignment(Alignment::Center);
//! let bytes = doc.to_bytes()?;
//!
//! let reopened = Document::from_bytes(&bytes)?;
//! assert_eq!(reopened.paragraphs().count(), 2);
//! # Ok::<(), docweave_ooxml::OoxmlError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use crate::content_types::types;
use crate::error::{OoxmlError, Result, ResultExt};
use crate::ids::{IdAllocator, IdNamespace};
use crate::model::{
    parse_document_xml, write_document_xml, Body, BodyElement, BookmarkEnd, BookmarkStart,
    Paragraph, SectionProperties, Table, TextFormat,
};
use crate::package::{Package, DEFAULT_MAIN_PART};
use crate::relationships::rel_types;

/// Styles part created for new documents
pub const STYLES_PATH: &str = "word/styles.xml";

/// Source of `styles.xml` for a document
///
/// Implemented by the style module. When a catalog is attached, its XML
/// replaces the styles part on every write.
pub trait StyleCatalog: fmt::Debug + Send + Sync {
    /// Whether a style with this id is defined
    fn contains(&self, style_id: &str) -> bool;

    /// Complete `w:styles` part
    fn to_xml(&self) -> String;
}

/// A bookmark opened with [`Document::start_bookmark`]
#[must_use = "an open bookmark must be closed with Document::end_bookmark"]
#[derive(Debug, PartialEq, Eq)]
pub struct OpenBookmark {
    id: u32,
    name: String,
}

impl OpenBookmark {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A Word document: package, body and identifier allocator
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    body: Body,
    ids: IdAllocator,
    /// Attributes of `w:document` as read, namespace declarations included
    root_attributes: Vec<(String, String)>,
    styles: Option<Arc<dyn StyleCatalog>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty A4 document with a default style set
    pub fn new() -> Self {
        let mut package = Package::new(DEFAULT_MAIN_PART);
        let mut ids = IdAllocator::new();

        package.put_string(STYLES_PATH, default_styles_xml());
        package.register_content_type(STYLES_PATH, types::STYLES);
        package.add_document_relationship("rId1", rel_types::STYLES, "styles.xml");
        ids.observe_relationship_id("rId1");

        let mut body = Body::new();
        body.push(SectionProperties::a4());

        Self {
            package,
            body,
            ids,
            root_attributes: Vec::new(),
            styles: None,
        }
    }

    /// Open a DOCX/DOTX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context("open", path.display().to_string())?;
        let doc = Self::from_reader(file)?;
        log::info!("opened {} ({} body elements)", path.display(), doc.body.len());
        Ok(doc)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(Package::from_reader(reader)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Parse the main part of an unpacked package
    ///
    /// Ids already in use are observed so freshly allocated ids never
    /// collide with them: relationship ids, and every id declared in the
    /// main part or in the XML parts it links to (notes, numbering,
    /// headers and footers).
    pub fn from_package(mut package: Package) -> Result<Self> {
        let part = package.main_part().to_string();
        let xml = package
            .take(&part)
            .ok_or_else(|| OoxmlError::MissingPart(part.clone()))?;
        let parsed = parse_document_xml(&xml, &part)?;

        let mut ids = IdAllocator::new();
        ids.observe_part(&xml, &part)?;
        let main_dir = parent_dir(&part);
        for rel in package.document_relationships() {
            ids.observe_relationship_id(&rel.id);
            if rel.external {
                continue;
            }
            let path = resolve_target(main_dir, &rel.target);
            let Some(linked) = package.get(&path).filter(|_| path.ends_with(".xml")) else {
                continue;
            };
            if let Err(e) = ids.observe_part(linked, &path) {
                log::warn!("ids in {} not observed: {}", path, e);
            }
        }

        log::debug!(
            "parsed {}: {} body elements, {} document relationships",
            part,
            parsed.body.len(),
            package.document_relationships().len()
        );

        Ok(Self {
            package,
            body: parsed.body,
            ids,
            root_attributes: parsed.root_attributes,
            styles: None,
        })
    }

    /// Serialize the main part, the same XML a write would store
    pub fn document_xml(&self) -> Result<String> {
        write_document_xml(&self.body, &self.root_attributes)
            .context("serialize", self.package.main_part().to_string())
    }

    /// Write the document to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut generated = BTreeMap::new();
        generated.insert(
            self.package.main_part().to_string(),
            self.document_xml()?.into_bytes(),
        );
        if let Some(catalog) = &self.styles {
            if let Some(path) = self.styles_part_path() {
                generated.insert(path, catalog.to_xml().into_bytes());
            }
        }
        self.package.write_with(writer, generated)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).context("save", path.display().to_string())?;
        self.write_to(file)?;
        log::info!("saved {} ({} body elements)", path.display(), self.body.len());
        Ok(())
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// The allocator feature modules draw fresh ids from
    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    fn push_paragraph(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        self.body.elements.push(BodyElement::Paragraph(paragraph));
        match self.body.elements.last_mut() {
            Some(BodyElement::Paragraph(p)) => p,
            _ => unreachable!("a paragraph was just pushed"),
        }
    }

    /// Append a paragraph of plain text
    pub fn add_paragraph(&mut self, text: impl Into<String>) -> &mut Paragraph {
        self.push_paragraph(Paragraph::with_text(text))
    }

    /// Append a paragraph whose single run is formatted from `format`
    pub fn add_formatted_paragraph(
        &mut self,
        text: impl Into<String>,
        format: &TextFormat,
    ) -> &mut Paragraph {
        let mut paragraph = Paragraph::new();
        paragraph.add_formatted_text(text, format);
        self.push_paragraph(paragraph)
    }

    /// Append a heading paragraph styled `Heading{level}`
    ///
    /// Levels above 9 become 9; zero and negative levels become 1.
    pub fn add_heading(&mut self, text: impl Into<String>, level: i32) -> &mut Paragraph {
        let level = if level < 1 { 1 } else { level.min(9) };
        let mut paragraph = Paragraph::with_text(text);
        paragraph.set_style(format!("Heading{}", level));
        self.push_paragraph(paragraph)
    }

    /// Append an empty table
    pub fn add_table(&mut self, rows: usize, cols: usize) -> &mut Table {
        self.body.elements.push(BodyElement::Table(Table::new(rows, cols)));
        match self.body.elements.last_mut() {
            Some(BodyElement::Table(t)) => t,
            _ => unreachable!("a table was just pushed"),
        }
    }

    /// Append a fragment built elsewhere
    pub fn add_element(&mut self, element: impl Into<BodyElement>) {
        self.body.push(element);
    }

    /// Insert a fragment before `index`, appending when out of range
    pub fn insert_element(&mut self, index: usize, element: impl Into<BodyElement>) {
        self.body.insert(index, element);
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.paragraphs()
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.body.paragraphs_mut()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.tables()
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.body.tables_mut()
    }

    pub fn section_properties(&self) -> Option<&SectionProperties> {
        self.body.section_properties()
    }

    /// Replace the document's final section properties
    pub fn set_section_properties(&mut self, section: SectionProperties) {
        self.body.set_section_properties(section);
    }

    /// Text of the whole body, one line per paragraph
    pub fn plain_text(&self) -> String {
        self.body.plain_text()
    }

    /// Open a bookmark at the current end of the body
    ///
    /// Everything appended until the matching [`end_bookmark`](Self::end_bookmark)
    /// lies inside it.
    pub fn start_bookmark(&mut self, name: impl Into<String>) -> Result<OpenBookmark> {
        let id = self.ids.next(IdNamespace::Bookmark)?;
        let name = name.into();
        self.body.elements.push(BodyElement::BookmarkStart(BookmarkStart {
            id,
            name: name.clone(),
        }));
        Ok(OpenBookmark { id, name })
    }

    pub fn end_bookmark(&mut self, bookmark: OpenBookmark) {
        self.body
            .elements
            .push(BodyElement::BookmarkEnd(BookmarkEnd { id: bookmark.id }));
    }

    /// Register a relationship of the main part under a fresh id
    pub fn add_relationship(&mut self, rel_type: &str, target: &str) -> Result<String> {
        let id = self.ids.next_relationship_id()?;
        self.package.add_document_relationship(&id, rel_type, target);
        Ok(id)
    }

    /// Store a new part with its content type
    ///
    /// With `rel_type`, the part is also linked from the main document and
    /// the new relationship id is returned.
    pub fn add_part(
        &mut self,
        path: &str,
        contents: Vec<u8>,
        content_type: &str,
        rel_type: Option<&str>,
    ) -> Result<Option<String>> {
        let path = path.trim_start_matches('/');
        self.package.put(path, contents);
        self.package.register_content_type(path, content_type);
        log::debug!("added part {} ({})", path, content_type);

        let Some(rel_type) = rel_type else {
            return Ok(None);
        };
        let target = self.relative_target(path);
        self.add_relationship(rel_type, &target).map(Some)
    }

    /// Attach the catalog that supplies `styles.xml`
    pub fn set_style_catalog(&mut self, catalog: Arc<dyn StyleCatalog>) -> Result<()> {
        if self.styles_part_path().is_none() {
            self.package.register_content_type(STYLES_PATH, types::STYLES);
            let target = self.relative_target(STYLES_PATH);
            self.add_relationship(rel_types::STYLES, &target)?;
        }
        self.styles = Some(catalog);
        Ok(())
    }

    pub fn style_catalog(&self) -> Option<&Arc<dyn StyleCatalog>> {
        self.styles.as_ref()
    }

    /// Archive path of the styles part linked from the main document
    pub fn styles_part_path(&self) -> Option<String> {
        let rel = self
            .package
            .document_relationships()
            .first_of_type(rel_types::STYLES)?;
        Some(self.resolve_target(&rel.target))
    }

    fn main_dir(&self) -> &str {
        parent_dir(self.package.main_part())
    }

    /// Relationship target for an archive path, relative to the main part
    fn relative_target(&self, path: &str) -> String {
        let dir = self.main_dir();
        if dir.is_empty() {
            return path.to_string();
        }
        match path.strip_prefix(dir).and_then(|p| p.strip_prefix('/')) {
            Some(rest) => rest.to_string(),
            None => format!("/{}", path),
        }
    }

    /// Archive path for a relationship target of the main part
    fn resolve_target(&self, target: &str) -> String {
        resolve_target(self.main_dir(), target)
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Archive path of `target` relative to the folder `dir`
fn resolve_target(dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// `Normal` plus `Heading1` to `Heading9`
fn default_styles_xml() -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(
        r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    );
    xml.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    );
    for level in 1..=9u32 {
        // Sizes step down from 16pt to 11pt
        let size = 32u32.saturating_sub((level - 1) * 2).max(22);
        xml.push_str(&format!(
            concat!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{0}">"#,
                r#"<w:name w:val="heading {0}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
                r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="60"/><w:outlineLvl w:val="{1}"/></w:pPr>"#,
                r#"<w:rPr><w:b/><w:sz w:val="{2}"/></w:rPr></w:style>"#
            ),
            level,
            level - 1,
            size
        ));
    }
    xml.push_str("</w:styles>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{docx_with_body, minimal_docx};

    #[derive(Debug)]
    struct FixedStyles;

    impl StyleCatalog for FixedStyles {
        fn contains(&self, style_id: &str) -> bool {
            style_id == "Custom"
        }

        fn to_xml(&self) -> String {
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:styleId="Custom"/></w:styles>"#.to_string()
        }
    }

    #[test]
    fn test_document_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }

    #[test]
    fn test_new_document_has_styles() {
        let doc = Document::new();
        assert_eq!(doc.styles_part_path().as_deref(), Some(STYLES_PATH));
        let styles = doc.package().get_str(STYLES_PATH).unwrap().unwrap();
        assert!(styles.contains(r#"w:styleId="Heading9""#));
        assert_eq!(doc.ids().peek(IdNamespace::Relationship), Some(2));
        assert!(doc.section_properties().is_some());
    }

    #[test]
    fn test_heading_level_clamped() {
        let mut doc = Document::new();
        doc.add_heading("zero", 0);
        doc.add_heading("deep", 12);
        doc.add_heading("two", 2);
        let styles: Vec<_> = doc
            .paragraphs()
            .map(|p| p.properties.style.clone().unwrap())
            .collect();
        assert_eq!(styles, vec!["Heading1", "Heading9", "Heading2"]);
    }

    #[test]
    fn test_formatted_paragraph() {
        let mut doc = Document::new();
        let format = TextFormat {
            bold: true,
            font_size: Some(14.0),
            color: Some("#336699".to_string()),
            font_name: Some("Arial".to_string()),
            ..TextFormat::default()
        };
        doc.add_formatted_paragraph("styled", &format);
        let run = &doc.paragraphs().next().unwrap().runs[0];
        assert!(run.properties.bold);
        assert_eq!(run.properties.size, Some(28));
        assert_eq!(run.properties.color.as_deref(), Some("336699"));
        assert_eq!(
            run.properties.fonts.as_ref().unwrap().east_asia.as_deref(),
            Some("Arial")
        );
    }

    #[test]
    fn test_bookmarks_bracket_content() {
        let mut doc = Document::new();
        doc.add_paragraph("before");
        let mark = doc.start_bookmark("inside").unwrap();
        let id = mark.id();
        doc.add_paragraph("one");
        doc.add_paragraph("two");
        doc.end_bookmark(mark);

        let elements = &doc.body().elements;
        let start = elements
            .iter()
            .position(|e| matches!(e, BodyElement::BookmarkStart(b) if b.id == id))
            .unwrap();
        let end = elements
            .iter()
            .position(|e| matches!(e, BodyElement::BookmarkEnd(b) if b.id == id))
            .unwrap();
        let inside: Vec<String> = elements[start + 1..end]
            .iter()
            .filter_map(|e| match e {
                BodyElement::Paragraph(p) => Some(p.text()),
                _ => None,
            })
            .collect();
        assert_eq!(inside, vec!["one", "two"]);

        let second = doc.start_bookmark("next").unwrap();
        assert_ne!(second.id(), id);
        doc.end_bookmark(second);
    }

    #[test]
    fn test_open_observes_existing_ids() {
        let docx = docx_with_body(
            r#"<w:bookmarkStart w:id="4" w:name="a"/><w:p><w:r><w:footnoteReference w:id="2"/></w:r></w:p><w:bookmarkEnd w:id="4"/>"#,
        );
        let mut doc = Document::from_bytes(&docx).unwrap();
        assert_eq!(doc.ids_mut().next(IdNamespace::Bookmark).unwrap(), 5);
        assert_eq!(doc.ids_mut().next(IdNamespace::Footnote).unwrap(), 3);
        assert_eq!(
            doc.add_relationship(rel_types::HYPERLINK, "https://x.org").unwrap(),
            "rId2"
        );
    }

    #[test]
    fn test_open_with_max_bookmark_id() {
        let docx = docx_with_body(
            r#"<w:bookmarkStart w:id="4294967295" w:name="a"/><w:bookmarkEnd w:id="4294967295"/><w:p/>"#,
        );
        let mut doc = Document::from_bytes(&docx).unwrap();
        assert_eq!(doc.body().len(), 3);
        assert!(matches!(
            doc.start_bookmark("b"),
            Err(OoxmlError::IdsExhausted(IdNamespace::Bookmark))
        ));
        assert_eq!(doc.ids_mut().next(IdNamespace::Footnote).unwrap(), 1);
    }

    #[test]
    fn test_open_observes_ids_in_linked_parts() {
        let mut doc = Document::new();
        doc.package_mut().put_string(
            "word/footnotes.xml",
            r#"<w:footnotes xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:footnote w:id="5"><w:p><w:r><w:t>note</w:t></w:r></w:p></w:footnote></w:footnotes>"#,
        );
        doc.add_relationship(rel_types::FOOTNOTES, "footnotes.xml").unwrap();
        doc.add_paragraph("body");

        let mut reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert!(reopened.ids_mut().next(IdNamespace::Footnote).unwrap() > 5);
    }

    #[test]
    fn test_open_observes_ids_nested_in_table_content() {
        let docx = docx_with_body(
            r#"<w:tbl><w:tr><w:tc><w:sdt><w:sdtContent><w:p><w:bookmarkStart w:id="12" w:name="deep"/><w:bookmarkEnd w:id="12"/></w:p></w:sdtContent></w:sdt></w:tc></w:tr></w:tbl>"#,
        );
        let mut doc = Document::from_bytes(&docx).unwrap();
        assert_eq!(doc.ids_mut().next(IdNamespace::Bookmark).unwrap(), 13);
    }

    #[test]
    fn test_add_part_links_from_main_document() {
        let mut doc = Document::new();
        let id = doc
            .add_part(
                "word/media/image1.png",
                vec![1, 2, 3],
                types::PNG,
                Some(rel_types::IMAGE),
            )
            .unwrap()
            .unwrap();
        assert_eq!(doc.package().document_relationships().get(&id), Some("media/image1.png"));
        assert_eq!(
            doc.package().content_types().content_type_for("word/media/image1.png"),
            Some(types::PNG)
        );
        assert!(doc
            .add_part("customXml/item1.xml", vec![], types::XML, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_roundtrip_through_bytes() {
        let mut doc = Document::from_bytes(&minimal_docx()).unwrap();
        doc.add_paragraph("added").set_style("Heading1");
        let table = doc.add_table(1, 2);
        table.set_cell_text(0, 1, "cell").unwrap();

        let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.plain_text(), "Template\nadded\n\ncell");
        assert!(reopened.section_properties().is_some());
        assert!(reopened.package().contains(STYLES_PATH));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Document::from_bytes(&minimal_docx()).unwrap();
        let mut copy = original.clone();
        copy.paragraphs_mut().next().unwrap().runs[0].set_text("changed");
        copy.package_mut().put_string("word/extra.xml", "<x/>");
        assert_eq!(original.plain_text(), "Template");
        assert!(!original.package().contains("word/extra.xml"));
    }

    #[test]
    fn test_style_catalog_replaces_styles_part() {
        let mut doc = Document::new();
        doc.set_style_catalog(Arc::new(FixedStyles)).unwrap();
        assert!(doc.style_catalog().unwrap().contains("Custom"));
        let bytes = doc.to_bytes().unwrap();
        let styles = crate::test_utils::extract_part(&bytes, STYLES_PATH).unwrap();
        assert!(styles.contains(r#"w:styleId="Custom""#));
        assert!(!styles.contains("Heading1"));
    }

    #[test]
    fn test_missing_main_part() {
        let mut package = Package::new("word/document.xml");
        package.put_string("word/other.xml", "<x/>");
        let err = Document::from_package(package).unwrap_err();
        assert!(matches!(err, OoxmlError::MissingPart(p) if p == "word/document.xml"));
    }

    #[test]
    fn test_resolve_target() {
        let doc = Document::new();
        assert_eq!(doc.resolve_target("styles.xml"), "word/styles.xml");
        assert_eq!(doc.resolve_target("../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(doc.resolve_target("/word/theme/theme1.xml"), "word/theme/theme1.xml");
    }
}
