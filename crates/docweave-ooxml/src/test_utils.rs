//! Shared test utilities for docweave-ooxml
//!
//! Builders for small in-memory packages, used by the unit tests here, the
//! integration tests and the template crate's tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::package::Package;

/// Namespace declarations for a test `w:document`
pub const DOCUMENT_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#
);

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
</w:styles>"#;

/// Wrap body content in a complete `word/document.xml`
pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {}><w:body>{}</w:body></w:document>"#,
        DOCUMENT_NAMESPACES, body
    )
}

/// A complete DOCX whose body is `body`
///
/// The package has a styles part behind `rId1`, so opened documents start
/// allocating relationship ids at `rId2`.
pub fn docx_with_body(body: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#,
    )
    .unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("word/_rels/document.xml.rels", options)
        .unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("word/styles.xml", options).unwrap();
    zip.write_all(STYLES_XML.as_bytes()).unwrap();

    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(document_xml(body).as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

/// A DOCX with one paragraph and an A4 section
pub fn minimal_docx() -> Vec<u8> {
    docx_with_body(
        r#"<w:p><w:r><w:t>Template</w:t></w:r></w:p><w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
    )
}

/// Read one part of a DOCX byte array as text
///
/// Generated parts are served from the regenerated bookkeeping.
pub fn extract_part(docx: &[u8], path: &str) -> Option<String> {
    let package = Package::from_reader(Cursor::new(docx)).unwrap();
    if path == package.document_relationships_path() {
        return Some(package.document_relationships().to_xml());
    }
    package.get_str(path).unwrap().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_docx_opens() {
        let docx = minimal_docx();
        let package = Package::from_reader(Cursor::new(&docx)).unwrap();
        assert!(package.contains("word/document.xml"));
        assert!(package.contains("word/styles.xml"));
    }

    #[test]
    fn test_extract_part() {
        let docx = docx_with_body("<w:p/>");
        let doc = extract_part(&docx, "word/document.xml").unwrap();
        assert!(doc.contains("<w:body><w:p/></w:body>"));
        assert!(extract_part(&docx, "word/_rels/document.xml.rels")
            .unwrap()
            .contains("styles.xml"));
        assert!(extract_part(&docx, "missing.xml").is_none());
    }
}
