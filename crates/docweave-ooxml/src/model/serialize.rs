//! Writing the body model back to WordprocessingML
//!
//! Serialization only reads the tree. The only failures are property
//! states that have no OOXML spelling, which are programmer errors.

use super::{
    BodyElement, BookmarkEnd, BookmarkStart, Body, BreakKind, CellProperties, Hyperlink, Paragraph,
    ParagraphProperties, RawXml, RowProperties, Run, RunContent, RunProperties, SdtProperties,
    SectionProperties, StructuredTag, Table, TableProperties, VerticalMerge, Width,
};
use super::section::{HeaderFooterRef, Orientation};
use crate::error::{OoxmlError, Result};
use crate::xml::{escape_attr, escape_text};

/// Namespace declarations written on `w:document` when none were read
pub const DEFAULT_NAMESPACES: &[(&str, &str)] = &[
    (
        "xmlns:w",
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    ),
    (
        "xmlns:r",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    ),
    (
        "xmlns:wp",
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
    ),
    ("xmlns:a", "http://schemas.openxmlformats.org/drawingml/2006/main"),
    (
        "xmlns:pic",
        "http://schemas.openxmlformats.org/drawingml/2006/picture",
    ),
    (
        "xmlns:mc",
        "http://schemas.openxmlformats.org/markup-compatibility/2006",
    ),
    ("xmlns:v", "urn:schemas-microsoft-com:vml"),
    ("xmlns:o", "urn:schemas-microsoft-com:office:office"),
];

/// Write a complete `word/document.xml`
///
/// `root_attributes` are the attributes of `w:document`, namespace
/// declarations included; any default namespace they lack is added.
pub fn write_document_xml(body: &Body, root_attributes: &[(String, String)]) -> Result<String> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str("<w:document");
    for (name, value) in root_attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
    }
    for (name, value) in DEFAULT_NAMESPACES {
        if !root_attributes.iter().any(|(n, _)| n == name) {
            out.push_str(&format!(" {}=\"{}\"", name, value));
        }
    }
    out.push_str(">\n");
    body.write_xml(&mut out)?;
    out.push_str("\n</w:document>");
    Ok(out)
}

impl Body {
    pub(crate) fn write_xml(&self, out: &mut String) -> Result<()> {
        out.push_str("<w:body>\n");
        let mut section = None;
        for element in &self.elements {
            match element {
                BodyElement::SectionProperties(s) => section = Some(s),
                other => write_element(other, out)?,
            }
        }
        if let Some(section) = section {
            write_section(section, out)?;
            out.push('\n');
        }
        out.push_str("</w:body>");
        Ok(())
    }
}

fn write_element(element: &BodyElement, out: &mut String) -> Result<()> {
    match element {
        BodyElement::Paragraph(p) => write_paragraph(p, out)?,
        BodyElement::Table(t) => write_table(t, out)?,
        // Only reachable inside structured tags; the body handles its own
        BodyElement::SectionProperties(s) => write_section(s, out)?,
        BodyElement::StructuredTag(sdt) => write_sdt(sdt, out)?,
        BodyElement::BookmarkStart(b) => write_bookmark_start(b, out),
        BodyElement::BookmarkEnd(b) => write_bookmark_end(b, out),
    }
    out.push('\n');
    Ok(())
}

fn write_bookmark_start(b: &BookmarkStart, out: &mut String) {
    out.push_str(&format!(
        "<w:bookmarkStart w:id=\"{}\" w:name=\"{}\"/>",
        b.id,
        escape_attr(&b.name)
    ));
}

fn write_bookmark_end(b: &BookmarkEnd, out: &mut String) {
    out.push_str(&format!("<w:bookmarkEnd w:id=\"{}\"/>", b.id));
}

fn val(out: &mut String, tag: &str, value: &str) {
    out.push_str(&format!("<w:{} w:val=\"{}\"/>", tag, escape_attr(value)));
}

fn raw(out: &mut String, xml: &Option<RawXml>) {
    if let Some(RawXml(xml)) = xml {
        out.push_str(xml);
    }
}

pub(crate) fn write_paragraph(p: &Paragraph, out: &mut String) -> Result<()> {
    out.push_str("<w:p>");
    write_paragraph_properties(&p.properties, out)?;
    let mut open_link: Option<&Hyperlink> = None;
    for run in &p.runs {
        let link = run.hyperlink.as_ref();
        if link != open_link {
            if open_link.is_some() {
                out.push_str("</w:hyperlink>");
            }
            if let Some(link) = link {
                write_hyperlink_start(link, out);
            }
            open_link = link;
        }
        write_run(run, out)?;
    }
    if open_link.is_some() {
        out.push_str("</w:hyperlink>");
    }
    out.push_str("</w:p>");
    Ok(())
}

fn write_hyperlink_start(link: &Hyperlink, out: &mut String) {
    out.push_str("<w:hyperlink");
    if let Some(id) = &link.relationship_id {
        out.push_str(&format!(" r:id=\"{}\"", escape_attr(id)));
    }
    if let Some(anchor) = &link.anchor {
        out.push_str(&format!(" w:anchor=\"{}\"", escape_attr(anchor)));
    }
    out.push('>');
}

/// Word only defines `Heading1` to `Heading9`
fn check_heading_style(style: &str) -> Result<()> {
    if let Some(level) = style.strip_prefix("Heading") {
        if let Ok(level) = level.parse::<u32>() {
            if !(1..=9).contains(&level) {
                return Err(OoxmlError::Serialize(format!(
                    "heading level {} outside 1..=9",
                    level
                )));
            }
        }
    }
    Ok(())
}

fn write_paragraph_properties(props: &ParagraphProperties, out: &mut String) -> Result<()> {
    if props.is_empty() {
        return Ok(());
    }
    out.push_str("<w:pPr>");
    if let Some(style) = &props.style {
        check_heading_style(style)?;
        val(out, "pStyle", style);
    }
    if props.keep_next {
        out.push_str("<w:keepNext/>");
    }
    if props.keep_lines {
        out.push_str("<w:keepLines/>");
    }
    if props.page_break_before {
        out.push_str("<w:pageBreakBefore/>");
    }
    if let Some(num) = &props.numbering {
        out.push_str(&format!(
            "<w:numPr><w:ilvl w:val=\"{}\"/><w:numId w:val=\"{}\"/></w:numPr>",
            num.level, num.num_id
        ));
    }
    if let Some(spacing) = &props.spacing {
        out.push_str("<w:spacing");
        if let Some(before) = spacing.before {
            out.push_str(&format!(" w:before=\"{}\"", before));
        }
        if let Some(after) = spacing.after {
            out.push_str(&format!(" w:after=\"{}\"", after));
        }
        if let Some(line) = spacing.line {
            out.push_str(&format!(" w:line=\"{}\"", line));
        }
        if let Some(rule) = &spacing.line_rule {
            out.push_str(&format!(" w:lineRule=\"{}\"", escape_attr(rule)));
        }
        out.push_str("/>");
    }
    if let Some(ind) = &props.indentation {
        out.push_str("<w:ind");
        if let Some(left) = ind.left {
            out.push_str(&format!(" w:left=\"{}\"", left));
        }
        if let Some(right) = ind.right {
            out.push_str(&format!(" w:right=\"{}\"", right));
        }
        if let Some(first) = ind.first_line {
            out.push_str(&format!(" w:firstLine=\"{}\"", first));
        }
        if let Some(hanging) = ind.hanging {
            out.push_str(&format!(" w:hanging=\"{}\"", hanging));
        }
        out.push_str("/>");
    }
    if let Some(alignment) = props.alignment {
        val(out, "jc", alignment.as_str());
    }
    if let Some(section) = &props.section {
        write_section(section, out)?;
    }
    out.push_str("</w:pPr>");
    Ok(())
}

pub(crate) fn write_run(run: &Run, out: &mut String) -> Result<()> {
    match &run.content {
        RunContent::BookmarkStart(b) => {
            write_bookmark_start(b, out);
            return Ok(());
        }
        RunContent::BookmarkEnd(b) => {
            write_bookmark_end(b, out);
            return Ok(());
        }
        _ => {}
    }
    out.push_str("<w:r>");
    write_run_properties(&run.properties, out)?;
    match &run.content {
        RunContent::Text(text) => {
            if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
                out.push_str(&format!(
                    "<w:t xml:space=\"preserve\">{}</w:t>",
                    escape_text(text)
                ));
            } else {
                out.push_str(&format!("<w:t>{}</w:t>", escape_text(text)));
            }
        }
        RunContent::Drawing(drawing) => out.push_str(&drawing.xml),
        RunContent::FieldChar(kind) => {
            out.push_str(&format!("<w:fldChar w:fldCharType=\"{}\"/>", kind.as_str()));
        }
        RunContent::FieldInstruction(code) => {
            out.push_str(&format!(
                "<w:instrText xml:space=\"preserve\">{}</w:instrText>",
                escape_text(code)
            ));
        }
        RunContent::Break(BreakKind::TextWrapping) => out.push_str("<w:br/>"),
        RunContent::Break(BreakKind::Page) => out.push_str("<w:br w:type=\"page\"/>"),
        RunContent::Break(BreakKind::Column) => out.push_str("<w:br w:type=\"column\"/>"),
        RunContent::Tab => out.push_str("<w:tab/>"),
        RunContent::FootnoteReference(id) => {
            out.push_str(&format!("<w:footnoteReference w:id=\"{}\"/>", id));
        }
        RunContent::EndnoteReference(id) => {
            out.push_str(&format!("<w:endnoteReference w:id=\"{}\"/>", id));
        }
        RunContent::BookmarkStart(_) | RunContent::BookmarkEnd(_) => {}
    }
    out.push_str("</w:r>");
    Ok(())
}

fn write_run_properties(props: &RunProperties, out: &mut String) -> Result<()> {
    if props.is_empty() {
        return Ok(());
    }
    out.push_str("<w:rPr>");
    if let Some(style) = &props.style {
        val(out, "rStyle", style);
    }
    if let Some(fonts) = &props.fonts {
        out.push_str("<w:rFonts");
        for (attr, value) in [
            ("ascii", &fonts.ascii),
            ("hAnsi", &fonts.h_ansi),
            ("eastAsia", &fonts.east_asia),
            ("cs", &fonts.cs),
            ("hint", &fonts.hint),
        ] {
            if let Some(value) = value {
                out.push_str(&format!(" w:{}=\"{}\"", attr, escape_attr(value)));
            }
        }
        out.push_str("/>");
    }
    if props.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if props.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    if props.strike {
        out.push_str("<w:strike/>");
    }
    if let Some(color) = &props.color {
        val(out, "color", color);
    }
    if let Some(size) = props.size {
        if size == 0 {
            return Err(OoxmlError::Serialize("font size of zero".to_string()));
        }
        out.push_str(&format!(
            "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>"
        ));
    }
    if let Some(highlight) = &props.highlight {
        val(out, "highlight", highlight);
    }
    if let Some(underline) = &props.underline {
        val(out, "u", underline);
    }
    if let Some(va) = props.vertical_align {
        val(out, "vertAlign", va.as_str());
    }
    out.push_str("</w:rPr>");
    Ok(())
}

fn write_width(out: &mut String, tag: &str, width: &Width) {
    out.push_str(&format!(
        "<w:{} w:w=\"{}\" w:type=\"{}\"/>",
        tag,
        width.value,
        width.unit.as_str()
    ));
}

pub(crate) fn write_table(table: &Table, out: &mut String) -> Result<()> {
    out.push_str("<w:tbl>");
    write_table_properties(&table.properties, out);
    out.push_str("<w:tblGrid>");
    for width in &table.grid {
        out.push_str(&format!("<w:gridCol w:w=\"{}\"/>", width));
    }
    out.push_str("</w:tblGrid>");
    for (index, row) in table.rows.iter().enumerate() {
        if row.cells.is_empty() {
            return Err(OoxmlError::Serialize(format!("table row {} has no cells", index)));
        }
        out.push_str("<w:tr>");
        write_row_properties(&row.properties, out);
        for cell in &row.cells {
            out.push_str("<w:tc>");
            write_cell_properties(&cell.properties, out)?;
            if cell.paragraphs.is_empty() {
                out.push_str("<w:p/>");
            }
            for p in &cell.paragraphs {
                write_paragraph(p, out)?;
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    Ok(())
}

fn write_table_properties(props: &TableProperties, out: &mut String) {
    out.push_str("<w:tblPr>");
    if let Some(style) = &props.style {
        val(out, "tblStyle", style);
    }
    if let Some(width) = &props.width {
        write_width(out, "tblW", width);
    }
    if let Some(alignment) = props.alignment {
        val(out, "jc", alignment.as_str());
    }
    raw(out, &props.borders);
    if props.fixed_layout {
        out.push_str("<w:tblLayout w:type=\"fixed\"/>");
    }
    raw(out, &props.cell_margins);
    raw(out, &props.look);
    out.push_str("</w:tblPr>");
}

fn write_row_properties(props: &RowProperties, out: &mut String) {
    if *props == RowProperties::default() {
        return;
    }
    out.push_str("<w:trPr>");
    if props.cant_split {
        out.push_str("<w:cantSplit/>");
    }
    if let Some(height) = props.height {
        out.push_str(&format!("<w:trHeight w:val=\"{}\"/>", height));
    }
    if props.header {
        out.push_str("<w:tblHeader/>");
    }
    out.push_str("</w:trPr>");
}

fn write_cell_properties(props: &CellProperties, out: &mut String) -> Result<()> {
    if *props == CellProperties::default() {
        return Ok(());
    }
    out.push_str("<w:tcPr>");
    if let Some(width) = &props.width {
        write_width(out, "tcW", width);
    }
    if let Some(span) = props.grid_span {
        if span == 0 {
            return Err(OoxmlError::Serialize("grid span of zero".to_string()));
        }
        out.push_str(&format!("<w:gridSpan w:val=\"{}\"/>", span));
    }
    match props.vertical_merge {
        Some(VerticalMerge::Restart) => out.push_str("<w:vMerge w:val=\"restart\"/>"),
        Some(VerticalMerge::Continue) => out.push_str("<w:vMerge/>"),
        None => {}
    }
    raw(out, &props.borders);
    raw(out, &props.shading);
    if let Some(align) = &props.vertical_align {
        val(out, "vAlign", align);
    }
    out.push_str("</w:tcPr>");
    Ok(())
}

fn write_references(out: &mut String, tag: &str, refs: &[HeaderFooterRef]) {
    for r in refs {
        out.push_str(&format!(
            "<w:{} w:type=\"{}\" r:id=\"{}\"/>",
            tag,
            r.kind.as_str(),
            escape_attr(&r.relationship_id)
        ));
    }
}

pub(crate) fn write_section(section: &SectionProperties, out: &mut String) -> Result<()> {
    out.push_str("<w:sectPr>");
    write_references(out, "headerReference", &section.headers);
    write_references(out, "footerReference", &section.footers);
    if let Some(size) = &section.page_size {
        out.push_str(&format!("<w:pgSz w:w=\"{}\" w:h=\"{}\"", size.width, size.height));
        if size.orientation == Orientation::Landscape {
            out.push_str(" w:orient=\"landscape\"");
        }
        out.push_str("/>");
    }
    if let Some(m) = &section.margins {
        out.push_str(&format!(
            "<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"{}\" w:footer=\"{}\" w:gutter=\"{}\"/>",
            m.top, m.right, m.bottom, m.left, m.header, m.footer, m.gutter
        ));
    }
    if let Some(numbering) = &section.page_numbering {
        out.push_str("<w:pgNumType");
        if let Some(format) = &numbering.format {
            out.push_str(&format!(" w:fmt=\"{}\"", escape_attr(format)));
        }
        if let Some(start) = numbering.start {
            out.push_str(&format!(" w:start=\"{}\"", start));
        }
        out.push_str("/>");
    }
    if let Some(cols) = &section.columns {
        if cols.count == 0 {
            return Err(OoxmlError::Serialize("section with zero columns".to_string()));
        }
        out.push_str(&format!("<w:cols w:num=\"{}\"", cols.count));
        if let Some(space) = cols.space {
            out.push_str(&format!(" w:space=\"{}\"", space));
        }
        out.push_str("/>");
    }
    if section.title_page {
        out.push_str("<w:titlePg/>");
    }
    if let Some(pitch) = section.line_pitch {
        out.push_str(&format!("<w:docGrid w:linePitch=\"{}\"/>", pitch));
    }
    out.push_str("</w:sectPr>");
    Ok(())
}

fn write_sdt(sdt: &StructuredTag, out: &mut String) -> Result<()> {
    out.push_str("<w:sdt>");
    write_sdt_properties(&sdt.properties, out);
    out.push_str("<w:sdtContent>");
    for element in &sdt.content {
        write_element(element, out)?;
    }
    out.push_str("</w:sdtContent></w:sdt>");
    Ok(())
}

fn write_sdt_properties(props: &SdtProperties, out: &mut String) {
    out.push_str("<w:sdtPr>");
    if let Some(alias) = &props.alias {
        val(out, "alias", alias);
    }
    if let Some(tag) = &props.tag {
        val(out, "tag", tag);
    }
    if let Some(id) = props.id {
        out.push_str(&format!("<w:id w:val=\"{}\"/>", id));
    }
    if props.doc_part_gallery.is_some() || props.doc_part_unique {
        out.push_str("<w:docPartObj>");
        if let Some(gallery) = &props.doc_part_gallery {
            val(out, "docPartGallery", gallery);
        }
        if props.doc_part_unique {
            out.push_str("<w:docPartUnique/>");
        }
        out.push_str("</w:docPartObj>");
    }
    out.push_str("</w:sdtPr>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, FieldCharKind, Paragraph, TableRow, TextFormat};

    #[test]
    fn test_section_always_last() {
        let mut body = Body::new();
        body.push(Paragraph::with_text("one"));
        body.push(SectionProperties::a4());
        body.push(Paragraph::with_text("two"));

        let xml = body.to_xml().unwrap();
        let sect = xml.find("<w:sectPr>").unwrap();
        assert!(xml.find("two").unwrap() < sect);
        assert!(xml[sect..].starts_with("<w:sectPr>"));
        assert!(xml.ends_with("</w:sectPr>\n</w:body>"));
    }

    #[test]
    fn test_only_last_section_written() {
        let mut body = Body::new();
        body.push(SectionProperties::a4());
        let mut wide = SectionProperties::a4();
        wide.set_landscape();
        body.push(wide);

        let xml = body.to_xml().unwrap();
        assert_eq!(xml.matches("<w:sectPr>").count(), 1);
        assert!(xml.contains("w:orient=\"landscape\""));
    }

    #[test]
    fn test_serialize_does_not_mutate() {
        let mut body = Body::new();
        body.push(SectionProperties::a4());
        body.push(Paragraph::with_text("x"));
        let before = body.clone();
        body.to_xml().unwrap();
        assert_eq!(body, before);
    }

    #[test]
    fn test_run_formatting_order() {
        let mut p = Paragraph::new();
        p.add_formatted_text(
            " spaced ",
            &TextFormat {
                bold: true,
                font_size: Some(12.0),
                color: Some("#336699".to_string()),
                font_name: Some("Arial".to_string()),
                ..TextFormat::default()
            },
        );
        p.set_alignment(Alignment::Center);
        let mut out = String::new();
        write_paragraph(&p, &mut out).unwrap();

        assert!(out.contains("<w:jc w:val=\"center\"/>"));
        assert!(out.contains("<w:t xml:space=\"preserve\"> spaced </w:t>"));
        let fonts = out.find("<w:rFonts").unwrap();
        let bold = out.find("<w:b/>").unwrap();
        let color = out.find("<w:color").unwrap();
        let size = out.find("<w:sz ").unwrap();
        assert!(fonts < bold && bold < color && color < size);
    }

    #[test]
    fn test_field_runs() {
        let mut p = Paragraph::new();
        p.add_run(Run::field_char(FieldCharKind::Begin));
        p.add_run(Run::field_instruction(" PAGE "));
        p.add_run(Run::field_char(FieldCharKind::End));
        let mut out = String::new();
        write_paragraph(&p, &mut out).unwrap();
        assert!(out.contains("<w:fldChar w:fldCharType=\"begin\"/>"));
        assert!(out.contains("<w:instrText xml:space=\"preserve\"> PAGE </w:instrText>"));
    }

    #[test]
    fn test_links_and_markers_between_runs() {
        let mut p = Paragraph::new();
        p.add_run(Run::new(RunContent::BookmarkStart(BookmarkStart {
            id: 3,
            name: "mark".to_string(),
        })));
        p.add_run(Run::link("one", "rId9"));
        p.add_run(Run::link(" two", "rId9"));
        p.add_run(Run::link("other", "rId10"));
        p.add_run(Run::new(RunContent::BookmarkEnd(BookmarkEnd { id: 3 })));
        let mut out = String::new();
        write_paragraph(&p, &mut out).unwrap();

        assert_eq!(
            out,
            concat!(
                r#"<w:p><w:bookmarkStart w:id="3" w:name="mark"/>"#,
                r#"<w:hyperlink r:id="rId9"><w:r><w:t>one</w:t></w:r><w:r><w:t xml:space="preserve"> two</w:t></w:r></w:hyperlink>"#,
                r#"<w:hyperlink r:id="rId10"><w:r><w:t>other</w:t></w:r></w:hyperlink>"#,
                r#"<w:bookmarkEnd w:id="3"/></w:p>"#,
            )
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let mut out = String::new();
        write_run(&Run::text("a<b & c"), &mut out).unwrap();
        assert!(out.contains("<w:t>a&lt;b &amp; c</w:t>"));
    }

    #[test]
    fn test_unrepresentable_states_fail() {
        let mut run = Run::text("x");
        run.properties.size = Some(0);
        assert!(matches!(
            write_run(&run, &mut String::new()),
            Err(OoxmlError::Serialize(_))
        ));

        let mut table = Table::new(1, 1);
        table.rows.push(TableRow::default());
        assert!(write_table(&table, &mut String::new()).is_err());

        let mut heading = Paragraph::with_text("deep");
        heading.set_style("Heading12");
        assert!(write_paragraph(&heading, &mut String::new()).is_err());
        heading.set_style("Heading9");
        assert!(write_paragraph(&heading, &mut String::new()).is_ok());
    }

    #[test]
    fn test_empty_cell_gets_paragraph() {
        let mut table = Table::new(1, 1);
        table.rows[0].cells[0].paragraphs.clear();
        let mut out = String::new();
        write_table(&table, &mut out).unwrap();
        assert!(out.contains("<w:tc><w:tcPr>"));
        assert!(out.contains("<w:p/></w:tc>"));
    }

    #[test]
    fn test_document_keeps_read_namespaces() {
        let attrs = vec![(
            "xmlns:w14".to_string(),
            "http://schemas.microsoft.com/office/word/2010/wordml".to_string(),
        )];
        let xml = write_document_xml(&Body::new(), &attrs).unwrap();
        assert!(xml.contains("xmlns:w14="));
        assert_eq!(xml.matches("xmlns:w=").count(), 1);
    }
}
