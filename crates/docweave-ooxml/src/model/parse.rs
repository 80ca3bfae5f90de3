//! Streaming parser for `word/document.xml`
//!
//! Each element kind the model knows gets its own small event loop that
//! returns on the element's end tag. Anything else is skipped with
//! [`skip_element`], so unknown markup never fails the parse.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::paragraph::{Alignment, Indentation, NumberingRef, Paragraph, ParagraphProperties, Spacing};
use super::run::{
    BreakKind, Drawing, FieldCharKind, Hyperlink, Run, RunContent, RunFonts, RunProperties,
    VerticalAlign,
};
use super::sdt::{SdtProperties, StructuredTag};
use super::section::{
    Columns, HeaderFooterKind, HeaderFooterRef, Orientation, PageMargins, PageNumbering, PageSize,
    SectionProperties,
};
use super::table::{
    CellProperties, RowProperties, Table, TableCell, TableProperties, TableRow, VerticalMerge,
    Width, WidthUnit,
};
use super::{Body, BodyElement, BookmarkEnd, BookmarkStart, RawXml};
use crate::error::{OoxmlError, Result};
use crate::xml::{attr, attr_num, capture_element, skip_element, toggle};

type XmlReader<'a> = Reader<&'a [u8]>;

/// The parsed content of a main document part
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Attributes of `w:document`, namespace declarations included
    pub root_attributes: Vec<(String, String)>,
    pub body: Body,
}

/// Parse a complete `word/document.xml`
///
/// `part` is the part name used in error messages.
pub fn parse_document_xml(xml: &[u8], part: &str) -> Result<ParsedDocument> {
    let mut reader = Reader::from_reader(xml);
    // Don't trim text - preserve whitespace in runs
    reader.config_mut().trim_text(false);

    let mut root_attributes = Vec::new();
    let mut body = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"document" => root_attributes = all_attributes(e),
                b"body" => {
                    body = Some(Body {
                        elements: parse_block_content(&mut reader, part)?,
                    })
                }
                _ => skip_element(&mut reader, part)?,
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"body" => {
                body = Some(Body::new());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    let body = body.ok_or_else(|| OoxmlError::structure(part, "no w:body element"))?;
    Ok(ParsedDocument {
        root_attributes,
        body,
    })
}

fn all_attributes(e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .filter_map(|a| a.ok())
        .filter_map(|a| {
            let key = String::from_utf8(a.key.as_ref().to_vec()).ok()?;
            let value = a.unescape_value().ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

fn unexpected_eof(part: &str) -> OoxmlError {
    OoxmlError::structure(part, "unexpected end of part")
}

fn bookmark_start(e: &BytesStart) -> Option<BookmarkStart> {
    Some(BookmarkStart {
        id: attr_num(e, b"id")?,
        name: attr(e, b"name").unwrap_or_default(),
    })
}

fn bookmark_end(e: &BytesStart) -> Option<BookmarkEnd> {
    Some(BookmarkEnd {
        id: attr_num(e, b"id")?,
    })
}

/// A bookmark marker met between runs
fn inline_marker(e: &BytesStart, link: Option<&Hyperlink>) -> Option<Run> {
    let content = match e.local_name().as_ref() {
        b"bookmarkStart" => RunContent::BookmarkStart(bookmark_start(e)?),
        b"bookmarkEnd" => RunContent::BookmarkEnd(bookmark_end(e)?),
        _ => return None,
    };
    Some(Run {
        hyperlink: link.cloned(),
        ..Run::new(content)
    })
}

/// Body-level content up to the parent's end tag (`w:body`, `w:sdtContent`)
fn parse_block_content(reader: &mut XmlReader, part: &str) -> Result<Vec<BodyElement>> {
    let mut elements = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => elements.push(BodyElement::Paragraph(parse_paragraph(reader, part)?)),
                b"tbl" => elements.push(BodyElement::Table(parse_table(reader, part)?)),
                b"sectPr" => {
                    elements.push(BodyElement::SectionProperties(parse_section(reader, part)?))
                }
                b"sdt" => elements.push(BodyElement::StructuredTag(parse_sdt(reader, part)?)),
                b"bookmarkStart" => {
                    elements.extend(bookmark_start(e).map(BodyElement::BookmarkStart));
                    skip_element(reader, part)?;
                }
                b"bookmarkEnd" => {
                    elements.extend(bookmark_end(e).map(BodyElement::BookmarkEnd));
                    skip_element(reader, part)?;
                }
                other => {
                    log::warn!(
                        "skipping unsupported <{}> in {}",
                        String::from_utf8_lossy(other),
                        part
                    );
                    skip_element(reader, part)?;
                }
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => elements.push(BodyElement::Paragraph(Paragraph::new())),
                b"sectPr" => elements.push(BodyElement::SectionProperties(SectionProperties::default())),
                b"bookmarkStart" => elements.extend(bookmark_start(e).map(BodyElement::BookmarkStart)),
                b"bookmarkEnd" => elements.extend(bookmark_end(e).map(BodyElement::BookmarkEnd)),
                _ => {}
            },
            Ok(Event::End(_)) => return Ok(elements),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_paragraph(reader: &mut XmlReader, part: &str) -> Result<Paragraph> {
    let mut paragraph = Paragraph::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"pPr" {
                    paragraph.properties = parse_paragraph_properties(reader, part)?;
                } else {
                    parse_inline(e, reader, part, None, &mut paragraph.runs)?;
                }
            }
            Ok(Event::Empty(ref e)) => paragraph.runs.extend(inline_marker(e, None)),
            Ok(Event::End(_)) => return Ok(paragraph),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

/// Runs and bookmark markers
///
/// Wrappers that only group runs (revisions, smart tags, inline content
/// controls) are flattened. A `w:hyperlink` is kept on every run inside it.
fn parse_inline(
    e: &BytesStart,
    reader: &mut XmlReader,
    part: &str,
    link: Option<&Hyperlink>,
    runs: &mut Vec<Run>,
) -> Result<()> {
    match e.local_name().as_ref() {
        b"r" => runs.extend(parse_run(reader, part)?.into_iter().map(|mut run| {
            run.hyperlink = link.cloned();
            run
        })),
        b"hyperlink" => {
            let link = Hyperlink {
                relationship_id: attr(e, b"id"),
                anchor: attr(e, b"anchor"),
            };
            parse_inline_children(reader, part, Some(&link), runs)?;
        }
        b"ins" | b"smartTag" | b"fldSimple" | b"customXml" | b"sdt" | b"sdtContent" => {
            parse_inline_children(reader, part, link, runs)?;
        }
        b"bookmarkStart" | b"bookmarkEnd" => {
            runs.extend(inline_marker(e, link));
            skip_element(reader, part)?;
        }
        _ => skip_element(reader, part)?,
    }
    Ok(())
}

fn parse_inline_children(
    reader: &mut XmlReader,
    part: &str,
    link: Option<&Hyperlink>,
    runs: &mut Vec<Run>,
) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => parse_inline(e, reader, part, link, runs)?,
            Ok(Event::Empty(ref e)) => runs.extend(inline_marker(e, link)),
            Ok(Event::End(_)) => return Ok(()),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn read_text(reader: &mut XmlReader, part: &str) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(t)) => {
                text.push_str(&t.unescape().map_err(|e| OoxmlError::xml(part, e))?);
            }
            Ok(Event::CData(c)) => text.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::Start(_)) => skip_element(reader, part)?,
            Ok(Event::End(_)) => return Ok(text),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn break_kind(e: &BytesStart) -> BreakKind {
    match attr(e, b"type").as_deref() {
        Some("page") => BreakKind::Page,
        Some("column") => BreakKind::Column,
        _ => BreakKind::TextWrapping,
    }
}

/// Payloads that can appear as empty elements inside `w:r`
fn empty_run_content(e: &BytesStart) -> Option<RunContent> {
    match e.local_name().as_ref() {
        b"t" => Some(RunContent::Text(String::new())),
        b"tab" => Some(RunContent::Tab),
        b"br" => Some(RunContent::Break(break_kind(e))),
        b"cr" => Some(RunContent::Break(BreakKind::TextWrapping)),
        b"fldChar" => attr(e, b"fldCharType")
            .and_then(|t| FieldCharKind::parse(&t))
            .map(RunContent::FieldChar),
        b"footnoteReference" => attr_num(e, b"id").map(RunContent::FootnoteReference),
        b"endnoteReference" => attr_num(e, b"id").map(RunContent::EndnoteReference),
        _ => None,
    }
}

/// One `w:r`, split into one [`Run`] per payload
fn parse_run(reader: &mut XmlReader, part: &str) -> Result<Vec<Run>> {
    let mut properties = RunProperties::default();
    let mut contents = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"rPr" => properties = parse_run_properties(reader, part)?,
                b"t" => contents.push(RunContent::Text(read_text(reader, part)?)),
                b"instrText" => contents.push(RunContent::FieldInstruction(read_text(reader, part)?)),
                b"drawing" | b"pict" | b"object" | b"AlternateContent" => {
                    let xml = capture_element(reader, e, false, part)?;
                    contents.push(RunContent::Drawing(Drawing::new(xml)));
                }
                _ => {
                    contents.extend(empty_run_content(e));
                    skip_element(reader, part)?;
                }
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"instrText" => contents.push(RunContent::FieldInstruction(String::new())),
                b"rPr" => {}
                _ => contents.extend(empty_run_content(e)),
            },
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(contents
        .into_iter()
        .map(|content| Run {
            properties: properties.clone(),
            content,
            hyperlink: None,
        })
        .collect())
}

fn apply_run_property(props: &mut RunProperties, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"rStyle" => props.style = attr(e, b"val"),
        b"rFonts" => {
            props.fonts = Some(RunFonts {
                ascii: attr(e, b"ascii"),
                h_ansi: attr(e, b"hAnsi"),
                east_asia: attr(e, b"eastAsia"),
                cs: attr(e, b"cs"),
                hint: attr(e, b"hint"),
            })
        }
        b"b" => props.bold = toggle(e),
        b"i" => props.italic = toggle(e),
        b"strike" => props.strike = toggle(e),
        b"color" => props.color = attr(e, b"val"),
        b"sz" => props.size = attr_num(e, b"val"),
        b"highlight" => props.highlight = attr(e, b"val").filter(|v| v != "none"),
        b"u" => props.underline = attr(e, b"val").filter(|v| v != "none"),
        b"vertAlign" => {
            props.vertical_align = attr(e, b"val").and_then(|v| VerticalAlign::parse(&v))
        }
        _ => {}
    }
}

fn parse_run_properties(reader: &mut XmlReader, part: &str) -> Result<RunProperties> {
    let mut props = RunProperties::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                apply_run_property(&mut props, e);
                skip_element(reader, part)?;
            }
            Ok(Event::Empty(ref e)) => apply_run_property(&mut props, e),
            Ok(Event::End(_)) => return Ok(props),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_paragraph_properties(reader: &mut XmlReader, part: &str) -> Result<ParagraphProperties> {
    let mut props = ParagraphProperties::default();
    let mut num_id: Option<u32> = None;
    let mut level: Option<u32> = None;
    // numPr is descended into rather than skipped
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        let (e, is_start) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                buf.clear();
                continue;
            }
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {
                buf.clear();
                continue;
            }
        };

        match e.local_name().as_ref() {
            b"numPr" if is_start => {
                depth += 1;
                buf.clear();
                continue;
            }
            b"sectPr" if is_start => {
                props.section = Some(Box::new(parse_section(reader, part)?));
                buf.clear();
                continue;
            }
            b"pStyle" => props.style = attr(&e, b"val"),
            b"keepNext" => props.keep_next = toggle(&e),
            b"keepLines" => props.keep_lines = toggle(&e),
            b"pageBreakBefore" => props.page_break_before = toggle(&e),
            b"ilvl" => level = attr_num(&e, b"val"),
            b"numId" => num_id = attr_num(&e, b"val"),
            b"spacing" => {
                props.spacing = Some(Spacing {
                    before: attr_num(&e, b"before"),
                    after: attr_num(&e, b"after"),
                    line: attr_num(&e, b"line"),
                    line_rule: attr(&e, b"lineRule"),
                })
            }
            b"ind" => {
                props.indentation = Some(Indentation {
                    left: attr_num(&e, b"left").or_else(|| attr_num(&e, b"start")),
                    right: attr_num(&e, b"right").or_else(|| attr_num(&e, b"end")),
                    first_line: attr_num(&e, b"firstLine"),
                    hanging: attr_num(&e, b"hanging"),
                })
            }
            b"jc" => props.alignment = attr(&e, b"val").and_then(|v| Alignment::parse(&v)),
            _ => {}
        }
        if is_start {
            skip_element(reader, part)?;
        }
        buf.clear();
    }

    props.numbering = num_id.map(|num_id| NumberingRef {
        num_id,
        level: level.unwrap_or(0),
    });
    Ok(props)
}

fn header_footer_ref(e: &BytesStart) -> Option<HeaderFooterRef> {
    Some(HeaderFooterRef {
        kind: HeaderFooterKind::parse(&attr(e, b"type").unwrap_or_else(|| "default".into()))?,
        relationship_id: attr(e, b"id")?,
    })
}

fn apply_section_property(section: &mut SectionProperties, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"headerReference" => section.headers.extend(header_footer_ref(e)),
        b"footerReference" => section.footers.extend(header_footer_ref(e)),
        b"pgSz" => {
            section.page_size = Some(PageSize {
                width: attr_num(e, b"w").unwrap_or(0),
                height: attr_num(e, b"h").unwrap_or(0),
                orientation: match attr(e, b"orient").as_deref() {
                    Some("landscape") => Orientation::Landscape,
                    _ => Orientation::Portrait,
                },
            })
        }
        b"pgMar" => {
            section.margins = Some(PageMargins {
                top: attr_num(e, b"top").unwrap_or(0),
                right: attr_num(e, b"right").unwrap_or(0),
                bottom: attr_num(e, b"bottom").unwrap_or(0),
                left: attr_num(e, b"left").unwrap_or(0),
                header: attr_num(e, b"header").unwrap_or(0),
                footer: attr_num(e, b"footer").unwrap_or(0),
                gutter: attr_num(e, b"gutter").unwrap_or(0),
            })
        }
        b"pgNumType" => {
            section.page_numbering = Some(PageNumbering {
                format: attr(e, b"fmt"),
                start: attr_num(e, b"start"),
            })
        }
        b"cols" => {
            section.columns = Some(Columns {
                count: attr_num(e, b"num").unwrap_or(1),
                space: attr_num(e, b"space"),
            })
        }
        b"titlePg" => section.title_page = toggle(e),
        b"docGrid" => section.line_pitch = attr_num(e, b"linePitch"),
        _ => {}
    }
}

fn parse_section(reader: &mut XmlReader, part: &str) -> Result<SectionProperties> {
    let mut section = SectionProperties::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                apply_section_property(&mut section, e);
                skip_element(reader, part)?;
            }
            Ok(Event::Empty(ref e)) => apply_section_property(&mut section, e),
            Ok(Event::End(_)) => return Ok(section),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn width(e: &BytesStart) -> Width {
    Width {
        value: attr_num(e, b"w").unwrap_or(0),
        unit: WidthUnit::parse(&attr(e, b"type").unwrap_or_default()),
    }
}

fn parse_table(reader: &mut XmlReader, part: &str) -> Result<Table> {
    let mut table = Table::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tblPr" => table.properties = parse_table_properties(reader, part)?,
                b"tblGrid" => table.grid = parse_grid(reader, part)?,
                b"tr" => table.rows.push(parse_row(reader, part)?),
                _ => skip_element(reader, part)?,
            },
            Ok(Event::End(_)) => return Ok(table),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_table_properties(reader: &mut XmlReader, part: &str) -> Result<TableProperties> {
    let mut props = TableProperties::default();
    let mut buf = Vec::new();
    loop {
        let (e, is_start) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(_)) => return Ok(props),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {
                buf.clear();
                continue;
            }
        };

        let mut consumed = false;
        match e.local_name().as_ref() {
            b"tblStyle" => props.style = attr(&e, b"val"),
            b"tblW" => props.width = Some(width(&e)),
            b"jc" => props.alignment = attr(&e, b"val").and_then(|v| Alignment::parse(&v)),
            b"tblLayout" => props.fixed_layout = attr(&e, b"type").as_deref() == Some("fixed"),
            b"tblBorders" => {
                props.borders = Some(RawXml(capture_element(reader, &e, !is_start, part)?));
                consumed = true;
            }
            b"tblCellMar" => {
                props.cell_margins = Some(RawXml(capture_element(reader, &e, !is_start, part)?));
                consumed = true;
            }
            b"tblLook" => {
                props.look = Some(RawXml(capture_element(reader, &e, !is_start, part)?));
                consumed = true;
            }
            _ => {}
        }
        if is_start && !consumed {
            skip_element(reader, part)?;
        }
        buf.clear();
    }
}

fn parse_grid(reader: &mut XmlReader, part: &str) -> Result<Vec<u32>> {
    let mut grid = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"gridCol" {
                    grid.push(attr_num(e, b"w").unwrap_or(0));
                }
                skip_element(reader, part)?;
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"gridCol" => {
                grid.push(attr_num(e, b"w").unwrap_or(0));
            }
            Ok(Event::End(_)) => return Ok(grid),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_row(reader: &mut XmlReader, part: &str) -> Result<TableRow> {
    let mut row = TableRow::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"trPr" => row.properties = parse_row_properties(reader, part)?,
                b"tc" => row.cells.push(parse_cell(reader, part)?),
                _ => skip_element(reader, part)?,
            },
            Ok(Event::End(_)) => return Ok(row),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn apply_row_property(props: &mut RowProperties, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"cantSplit" => props.cant_split = toggle(e),
        b"trHeight" => props.height = attr_num(e, b"val"),
        b"tblHeader" => props.header = toggle(e),
        _ => {}
    }
}

fn parse_row_properties(reader: &mut XmlReader, part: &str) -> Result<RowProperties> {
    let mut props = RowProperties::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                apply_row_property(&mut props, e);
                skip_element(reader, part)?;
            }
            Ok(Event::Empty(ref e)) => apply_row_property(&mut props, e),
            Ok(Event::End(_)) => return Ok(props),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_cell(reader: &mut XmlReader, part: &str) -> Result<TableCell> {
    let mut cell = TableCell::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tcPr" => cell.properties = parse_cell_properties(reader, part)?,
                b"p" => cell.paragraphs.push(parse_paragraph(reader, part)?),
                other => {
                    log::debug!(
                        "skipping <{}> inside table cell in {}",
                        String::from_utf8_lossy(other),
                        part
                    );
                    skip_element(reader, part)?;
                }
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"p" => {
                cell.paragraphs.push(Paragraph::new());
            }
            Ok(Event::End(_)) => return Ok(cell),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_cell_properties(reader: &mut XmlReader, part: &str) -> Result<CellProperties> {
    let mut props = CellProperties::default();
    let mut buf = Vec::new();
    loop {
        let (e, is_start) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(_)) => return Ok(props),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {
                buf.clear();
                continue;
            }
        };

        let mut consumed = false;
        match e.local_name().as_ref() {
            b"tcW" => props.width = Some(width(&e)),
            b"gridSpan" => props.grid_span = attr_num(&e, b"val"),
            b"vMerge" => {
                props.vertical_merge = Some(match attr(&e, b"val").as_deref() {
                    Some("restart") => VerticalMerge::Restart,
                    _ => VerticalMerge::Continue,
                })
            }
            b"vAlign" => props.vertical_align = attr(&e, b"val"),
            b"tcBorders" => {
                props.borders = Some(RawXml(capture_element(reader, &e, !is_start, part)?));
                consumed = true;
            }
            b"shd" => {
                props.shading = Some(RawXml(capture_element(reader, &e, !is_start, part)?));
                consumed = true;
            }
            _ => {}
        }
        if is_start && !consumed {
            skip_element(reader, part)?;
        }
        buf.clear();
    }
}

fn parse_sdt(reader: &mut XmlReader, part: &str) -> Result<StructuredTag> {
    let mut sdt = StructuredTag::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"sdtPr" => sdt.properties = parse_sdt_properties(reader, part)?,
                b"sdtContent" => sdt.content = parse_block_content(reader, part)?,
                _ => skip_element(reader, part)?,
            },
            Ok(Event::End(_)) => return Ok(sdt),
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_sdt_properties(reader: &mut XmlReader, part: &str) -> Result<SdtProperties> {
    let mut props = SdtProperties::default();
    // docPartObj is descended into rather than skipped
    let mut depth = 0usize;
    let mut buf = Vec::new();
    loop {
        let (e, is_start) = match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return Ok(props);
                }
                depth -= 1;
                buf.clear();
                continue;
            }
            Ok(Event::Eof) => return Err(unexpected_eof(part)),
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {
                buf.clear();
                continue;
            }
        };

        match e.local_name().as_ref() {
            b"docPartObj" if is_start => {
                depth += 1;
                buf.clear();
                continue;
            }
            b"id" => props.id = attr_num(&e, b"val"),
            b"alias" => props.alias = attr(&e, b"val"),
            b"tag" => props.tag = attr(&e, b"val"),
            b"docPartGallery" => props.doc_part_gallery = attr(&e, b"val"),
            b"docPartUnique" => props.doc_part_unique = toggle(&e),
            _ => {}
        }
        if is_start {
            skip_element(reader, part)?;
        }
        buf.clear();
    }
}
