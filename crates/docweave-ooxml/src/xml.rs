//! Small helpers shared by the part parsers and serializers

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{OoxmlError, Result};

/// Escape special XML characters in text content
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape special XML characters in attribute values
pub fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Get an attribute value by local name, ignoring the namespace prefix
pub(crate) fn attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `w:val` parsed as a number
pub(crate) fn attr_num<T: std::str::FromStr>(e: &BytesStart, local: &[u8]) -> Option<T> {
    attr(e, local).and_then(|v| v.parse().ok())
}

/// On/off properties such as `<w:b/>` are on unless `w:val` says otherwise
pub(crate) fn toggle(e: &BytesStart) -> bool {
    !matches!(
        attr(e, b"val").as_deref(),
        Some("0") | Some("false") | Some("off")
    )
}

/// Discard everything up to the end tag matching an already consumed start tag
///
/// Nested start and end tags are counted so the reader stops exactly at the
/// closing tag of the skipped element, whatever it contains.
pub(crate) fn skip_element(reader: &mut Reader<&[u8]>, part: &str) -> Result<()> {
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Ok(Event::Eof) => {
                return Err(OoxmlError::structure(part, "unexpected end of part"));
            }
            Err(e) => return Err(OoxmlError::xml(part, e)),
            _ => {}
        }
        buf.clear();
    }
}

/// Re-serialize an element and all of its content as raw XML
///
/// Used for fragments the model keeps opaque (drawings, borders, shading).
/// `start` has already been read; for `Event::Empty` pass `empty = true`.
pub(crate) fn capture_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
    part: &str,
) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    if empty {
        writer
            .write_event(Event::Empty(start.borrow()))
            .map_err(|e| write_failed(part, e))?;
    } else {
        writer
            .write_event(Event::Start(start.borrow()))
            .map_err(|e| write_failed(part, e))?;

        let mut depth = 1usize;
        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| OoxmlError::xml(part, e))?;
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => {
                    return Err(OoxmlError::structure(part, "unexpected end of part"));
                }
                _ => {}
            }
            writer.write_event(event).map_err(|e| write_failed(part, e))?;
            if depth == 0 {
                break;
            }
            buf.clear();
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|_| OoxmlError::structure(part, "captured fragment is not UTF-8"))
}

fn write_failed(part: &str, e: impl std::fmt::Display) -> OoxmlError {
    OoxmlError::structure(part, e.to_string())
}
