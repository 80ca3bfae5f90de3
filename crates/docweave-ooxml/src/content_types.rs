//! `[Content_Types].xml`: the media type of every part in a package
//!
//! A part's type comes from an `Override` for its exact part name, or
//! failing that from a `Default` for its file extension.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::xml::{attr, escape_attr};

/// Path of the content types part
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Common content types
pub mod types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const TEMPLATE: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const NUMBERING: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
    pub const HEADER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const FOOTER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const FOOTNOTES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
    pub const ENDNOTES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml";
    pub const SETTINGS: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
}

/// Defaults and overrides, in the order they were read or added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// (extension, content type)
    defaults: Vec<(String, String)>,
    /// (part name with leading `/`, content type)
    overrides: Vec<(String, String)>,
}

/// `/word/document.xml` for both `word/document.xml` and `/word/document.xml`
fn part_name(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entries every word processing package needs
    pub fn for_document(main_part: &str) -> Self {
        let mut ct = Self::new();
        ct.add_default("rels", types::RELATIONSHIPS);
        ct.add_default("xml", types::XML);
        ct.add_override(main_part, types::DOCUMENT);
        ct
    }

    pub fn parse(xml: &[u8], part: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut ct = Self::new();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match e.local_name().as_ref() {
                        b"Default" => {
                            let (Some(ext), Some(ty)) =
                                (attr(e, b"Extension"), attr(e, b"ContentType"))
                            else {
                                return Err(OoxmlError::structure(
                                    part,
                                    "Default without Extension or ContentType",
                                ));
                            };
                            ct.add_default(&ext, &ty);
                        }
                        b"Override" => {
                            let (Some(name), Some(ty)) =
                                (attr(e, b"PartName"), attr(e, b"ContentType"))
                            else {
                                return Err(OoxmlError::structure(
                                    part,
                                    "Override without PartName or ContentType",
                                ));
                            };
                            ct.add_override(&name, &ty);
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::xml(part, e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(ct)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, CONTENT_TYPES_NS));
        for (ext, ty) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_attr(ext),
                escape_attr(ty)
            ));
        }
        for (name, ty) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_attr(name),
                escape_attr(ty)
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    /// Set the type for an extension, replacing an earlier entry
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        match self.defaults.iter_mut().find(|(e, _)| *e == extension) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.defaults.push((extension, content_type.to_string())),
        }
    }

    /// Set the type for one part, replacing an earlier entry
    pub fn add_override(&mut self, path: &str, content_type: &str) {
        let name = part_name(path);
        match self.overrides.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((name, content_type.to_string())),
        }
    }

    pub fn remove_override(&mut self, path: &str) -> Option<String> {
        let name = part_name(path);
        let index = self.overrides.iter().position(|(n, _)| *n == name)?;
        Some(self.overrides.remove(index).1)
    }

    /// Resolve a part's type: override first, then extension default
    pub fn content_type_for(&self, path: &str) -> Option<&str> {
        let name = part_name(path);
        if let Some((_, ty)) = self.overrides.iter().find(|(n, _)| *n == name) {
            return Some(ty);
        }
        let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == extension)
            .map(|(_, ty)| ty.as_str())
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults.iter().map(|(e, t)| (e.as_str(), t.as_str()))
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }
}
