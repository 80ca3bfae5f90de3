//! Round-trip tests for the document model
//!
//! Parsing a body and serializing it again must keep every modeled element
//! in order, with exactly one section properties element, always last.

// =============================================================================
// PART 1: BODY XML ROUND-TRIP
// =============================================================================

mod body_xml {
    use docweave_ooxml::model::{parse_document_xml, write_document_xml, Body, BodyElement};
    use docweave_ooxml::test_utils::document_xml;

    const MIXED_BODY: &str = r#"
        <w:sectPr><w:pgSz w:w="16838" w:h="11906" w:orient="landscape"/></w:sectPr>
        <w:bookmarkStart w:id="0" w:name="top"/>
        <w:p><w:pPr><w:pStyle w:val="Title"/><w:jc w:val="center"/></w:pPr>
          <w:r><w:rPr><w:b/><w:sz w:val="48"/></w:rPr><w:t xml:space="preserve"> Annual </w:t></w:r>
          <w:r><w:rPr><w:i/></w:rPr><w:t>Report</w:t></w:r></w:p>
        <w:bookmarkEnd w:id="0"/>
        <w:tbl>
          <w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr>
          <w:tblGrid><w:gridCol w:w="4513"/><w:gridCol w:w="4513"/></w:tblGrid>
          <w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Value</w:t></w:r></w:p></w:tc></w:tr>
        </w:tbl>
        <w:sdt><w:sdtPr><w:id w:val="42"/><w:docPartObj><w:docPartGallery w:val="Table of Contents"/><w:docPartUnique/></w:docPartObj></w:sdtPr>
          <w:sdtContent><w:p><w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText xml:space="preserve"> TOC \o "1-3" </w:instrText></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r></w:p></w:sdtContent></w:sdt>
        <w:p><w:r><w:drawing><wp:inline><a:graphic><a:blip r:embed="rId7"/></a:graphic></wp:inline></w:drawing></w:r></w:p>
        <w:p/>
        <w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>
    "#;

    fn kinds(body: &Body) -> Vec<&'static str> {
        body.elements
            .iter()
            .map(|e| match e {
                BodyElement::Paragraph(_) => "p",
                BodyElement::Table(_) => "tbl",
                BodyElement::SectionProperties(_) => "sectPr",
                BodyElement::StructuredTag(_) => "sdt",
                BodyElement::BookmarkStart(_) => "bookmarkStart",
                BodyElement::BookmarkEnd(_) => "bookmarkEnd",
            })
            .collect()
    }

    #[test]
    fn test_order_kept_and_single_section_last() {
        let parsed = parse_document_xml(document_xml(MIXED_BODY).as_bytes(), "word/document.xml")
            .unwrap();
        assert_eq!(
            kinds(&parsed.body),
            vec!["sectPr", "bookmarkStart", "p", "bookmarkEnd", "tbl", "sdt", "p", "p", "sectPr"]
        );

        let xml = write_document_xml(&parsed.body, &parsed.root_attributes).unwrap();
        assert_eq!(xml.matches("<w:sectPr>").count(), 1);

        let reparsed = parse_document_xml(xml.as_bytes(), "word/document.xml").unwrap();
        assert_eq!(
            kinds(&reparsed.body),
            vec!["bookmarkStart", "p", "bookmarkEnd", "tbl", "sdt", "p", "p", "sectPr"]
        );
        // The surviving section is the last one inserted
        let section = reparsed.body.section_properties().unwrap();
        assert_eq!(section.page_size.unwrap().width, 11906);
    }

    #[test]
    fn test_serialization_is_a_fixed_point() {
        let first = parse_document_xml(document_xml(MIXED_BODY).as_bytes(), "word/document.xml")
            .unwrap();
        let xml1 = write_document_xml(&first.body, &first.root_attributes).unwrap();
        let second = parse_document_xml(xml1.as_bytes(), "word/document.xml").unwrap();
        let xml2 = write_document_xml(&second.body, &second.root_attributes).unwrap();
        assert_eq!(xml1, xml2);

        let third = parse_document_xml(xml2.as_bytes(), "word/document.xml").unwrap();
        assert_eq!(second.body, third.body);
    }

    #[test]
    fn test_run_formatting_survives() {
        let parsed = parse_document_xml(document_xml(MIXED_BODY).as_bytes(), "word/document.xml")
            .unwrap();
        let xml = write_document_xml(&parsed.body, &parsed.root_attributes).unwrap();
        let body = Body::parse(xml.as_bytes()).unwrap();

        let title = body.paragraphs().next().unwrap();
        assert_eq!(title.text(), " Annual Report");
        assert!(title.runs[0].properties.bold);
        assert_eq!(title.runs[0].properties.size, Some(48));
        assert!(!title.runs[1].properties.bold);
        assert!(title.runs[1].properties.italic);
    }

    #[test]
    fn test_drawing_kept_verbatim() {
        let parsed = parse_document_xml(document_xml(MIXED_BODY).as_bytes(), "word/document.xml")
            .unwrap();
        let xml = write_document_xml(&parsed.body, &parsed.root_attributes).unwrap();
        assert!(xml.contains(
            r#"<w:drawing><wp:inline><a:graphic><a:blip r:embed="rId7"/></a:graphic></wp:inline></w:drawing>"#
        ));
        assert!(xml.contains(r#"xmlns:wp="#));
    }
}

// =============================================================================
// PART 2: PACKAGE ROUND-TRIP
// =============================================================================

mod package_roundtrip {
    use docweave_ooxml::test_utils::{docx_with_body, extract_part};
    use docweave_ooxml::{rel_types, Document};

    #[test]
    fn test_unmodeled_parts_survive() {
        let mut doc = Document::from_bytes(&docx_with_body("<w:p><w:r><w:t>x</w:t></w:r></w:p>"))
            .unwrap();
        doc.package_mut()
            .put_string("customXml/item1.xml", "<data>kept</data>");
        doc.package_mut()
            .register_content_type("customXml/item1.xml", "application/xml");

        let bytes = doc.to_bytes().unwrap();
        assert_eq!(
            extract_part(&bytes, "customXml/item1.xml").as_deref(),
            Some("<data>kept</data>")
        );
        assert!(extract_part(&bytes, "word/styles.xml").is_some());
    }

    #[test]
    fn test_relationship_ids_never_collide_after_reopen() {
        let mut doc = Document::new();
        let first = doc
            .add_relationship(rel_types::HYPERLINK, "https://example.com/a")
            .unwrap();
        let reopened_bytes = doc.to_bytes().unwrap();

        let mut reopened = Document::from_bytes(&reopened_bytes).unwrap();
        let second = reopened
            .add_relationship(rel_types::HYPERLINK, "https://example.com/b")
            .unwrap();
        assert_ne!(first, second);
        assert!(reopened.package().document_relationships().contains(&first));
        assert_eq!(reopened.package().document_relationships().len(), 3);
    }

    #[test]
    fn test_inline_bookmarks_and_links_survive() {
        let body = r#"<w:p><w:bookmarkStart w:id="3" w:name="mark"/><w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink><w:bookmarkEnd w:id="3"/></w:p>"#;
        let doc = Document::from_bytes(&docx_with_body(body)).unwrap();
        let xml = extract_part(&doc.to_bytes().unwrap(), "word/document.xml").unwrap();

        assert!(xml.contains(concat!(
            r#"<w:p><w:bookmarkStart w:id="3" w:name="mark"/>"#,
            r#"<w:hyperlink r:id="rId9"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#,
            r#"<w:bookmarkEnd w:id="3"/></w:p>"#
        )));
    }

    #[test]
    fn test_saved_bytes_are_deterministic() {
        let mut doc = Document::new();
        doc.add_paragraph("same every time");
        assert_eq!(doc.to_bytes().unwrap(), doc.to_bytes().unwrap());
    }
}

// =============================================================================
// PART 3: FILESYSTEM
// =============================================================================

mod filesystem {
    use docweave_ooxml::{Document, OoxmlError};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.docx");

        let mut doc = Document::new();
        doc.add_heading("Saved", 1);
        doc.add_paragraph("to disk");
        doc.save(&path).unwrap();

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.plain_text(), "Saved\nto disk");
    }

    #[test]
    fn test_open_missing_file_names_operation() {
        let dir = tempdir().unwrap();
        let err = Document::open(dir.path().join("absent.docx")).unwrap_err();
        assert!(err.to_string().starts_with("document operation failed: open"));
        assert!(matches!(err.root_cause(), OoxmlError::Io(_)));
    }
}
