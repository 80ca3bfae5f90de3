//! Relationship parts (`_rels/*.rels`)
//!
//! A relationship part lists, for its source part, every other part or
//! external resource it points at. Ids are never invented here: the package
//! root uses fixed ids and the main document draws them from its
//! [`IdAllocator`](crate::ids::IdAllocator).
//!
//! ```
//! use docweave_ooxml::relationships::{rel_types, Relationships};
//!
//! let mut rels = Relationships::new();
//! rels.insert("rId1", rel_types::STYLES, "styles.xml");
//! assert_eq!(rels.get("rId1"), Some("styles.xml"));
//! ```

use std::fmt::Write as _;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::ids::relationship_number;
use crate::xml::{attr, escape_attr};

pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type URIs
pub mod rel_types {
    macro_rules! office_type {
        ($($name:ident => $suffix:literal),* $(,)?) => {
            $(pub const $name: &str = concat!(
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/",
                $suffix
            );)*
        };
    }

    office_type! {
        OFFICE_DOCUMENT => "officeDocument",
        EXTENDED_PROPERTIES => "extended-properties",
        HYPERLINK => "hyperlink",
        IMAGE => "image",
        STYLES => "styles",
        NUMBERING => "numbering",
        FOOTNOTES => "footnotes",
        ENDNOTES => "endnotes",
        HEADER => "header",
        FOOTER => "footer",
        FONT_TABLE => "fontTable",
        SETTINGS => "settings",
    }

    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
}

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Part path relative to the source part's folder, or a URL
    pub target: String,
    /// `TargetMode="External"`
    pub external: bool,
}

/// The entries of one relationship part, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a relationship part; `part` is its path, for error messages
    pub fn parse(xml: &[u8], part: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        let mut buf = Vec::new();
        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| OoxmlError::xml(part, e))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e)
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) else {
                        return Err(OoxmlError::structure(
                            part,
                            "Relationship without Id or Target",
                        ));
                    };
                    rels.put(Relationship {
                        id,
                        rel_type: attr(e, b"Type").unwrap_or_default(),
                        target,
                        external: attr(e, b"TargetMode").as_deref() == Some("External"),
                    });
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(rels)
    }

    /// Add or replace the relationship `id`
    ///
    /// Hyperlinks to `http(s)` URLs are marked external.
    pub fn insert(&mut self, id: &str, rel_type: &str, target: &str) {
        let external = rel_type == rel_types::HYPERLINK
            && (target.starts_with("http://") || target.starts_with("https://"));
        self.put(Relationship {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external,
        });
    }

    /// Add or replace `rel` as given; a replaced entry keeps its position
    pub fn put(&mut self, rel: Relationship) {
        match self.entries.iter_mut().find(|existing| existing.id == rel.id) {
            Some(existing) => *existing = rel,
            None => self.entries.push(rel),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let index = self.entries.iter().position(|rel| rel.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Target of relationship `id`
    pub fn get(&self, id: &str) -> Option<&str> {
        self.relationship(id).map(|rel| rel.target.as_str())
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.id == id)
    }

    /// First relationship of type `rel_type`
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|rel| rel.rel_type == rel_type)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.relationship(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Relationship> {
        self.entries.iter()
    }

    /// Highest `n` among ids of the form `rId{n}`
    pub fn max_numeric_id(&self) -> Option<u32> {
        self.entries
            .iter()
            .filter_map(|rel| relationship_number(&rel.id))
            .max()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{}\">\n",
            RELATIONSHIPS_NS
        );
        for rel in &self.entries {
            // writing into a String cannot fail
            let _ = write!(
                xml,
                "  <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"",
                escape_attr(&rel.id),
                escape_attr(&rel.rel_type),
                escape_attr(&rel.target)
            );
            if rel.external {
                xml.push_str(" TargetMode=\"External\"");
            }
            xml.push_str("/>\n");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

impl<'a> IntoIterator for &'a Relationships {
    type Item = &'a Relationship;
    type IntoIter = std::slice::Iter<'a, Relationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PART: &str = "word/_rels/document.xml.rels";

    fn document_rels() -> Relationships {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <Relationships xmlns="{ns}">
                <Relationship Id="rId1" Type="{styles}" Target="styles.xml"/>
                <Relationship Id="rId5" Type="{link}" Target="https://example.com" TargetMode="External"/>
                <Relationship Id="theme" Type="t" Target="theme/theme1.xml"/>
            </Relationships>"#,
            ns = RELATIONSHIPS_NS,
            styles = rel_types::STYLES,
            link = rel_types::HYPERLINK,
        );
        Relationships::parse(xml.as_bytes(), PART).unwrap()
    }

    #[test]
    fn test_parse_keeps_order_and_mode() {
        let rels = document_rels();
        let ids: Vec<&str> = rels.iter().map(|rel| rel.id.as_str()).collect();
        assert_eq!(ids, vec!["rId1", "rId5", "theme"]);
        assert_eq!(rels.get("rId1"), Some("styles.xml"));
        assert!(rels.relationship("rId5").unwrap().external);
        assert!(!rels.relationship("rId1").unwrap().external);
        assert_eq!(rels.first_of_type(rel_types::STYLES).unwrap().id, "rId1");
    }

    #[test]
    fn test_max_numeric_id_ignores_other_ids() {
        assert_eq!(document_rels().max_numeric_id(), Some(5));
        assert_eq!(Relationships::new().max_numeric_id(), None);
    }

    #[test]
    fn test_missing_target_names_part() {
        let xml = br#"<Relationships><Relationship Id="rId1" Type="x"/></Relationships>"#;
        let err = Relationships::parse(xml, PART).unwrap_err();
        assert!(err.to_string().contains(PART), "got: {}", err);
    }

    #[test]
    fn test_only_web_hyperlinks_are_external() {
        let mut rels = Relationships::new();
        rels.insert("rId1", rel_types::IMAGE, "https://example.com/a.png");
        rels.insert("rId2", rel_types::HYPERLINK, "https://example.com");
        rels.insert("rId3", rel_types::HYPERLINK, "#bookmark");

        let external: Vec<bool> = rels.iter().map(|rel| rel.external).collect();
        assert_eq!(external, vec![false, true, false]);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut rels = Relationships::new();
        rels.insert("rId1", "a", "first.xml");
        rels.insert("rId2", "b", "second.xml");
        rels.insert("rId1", "a", "replaced.xml");
        let targets: Vec<&str> = rels.iter().map(|rel| rel.target.as_str()).collect();
        assert_eq!(targets, vec!["replaced.xml", "second.xml"]);

        assert_eq!(rels.remove("rId1").unwrap().target, "replaced.xml");
        assert!(rels.remove("rId1").is_none());
        assert_eq!(rels.len(), 1);
    }

    #[test]
    fn test_to_xml_escapes_and_reparses() {
        let mut rels = Relationships::new();
        rels.insert("rId1", rel_types::STYLES, "a <b> & \"c\".xml");
        rels.insert("rId2", rel_types::HYPERLINK, "https://example.com/?q=1&r=2");

        let xml = rels.to_xml();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("&lt;b&gt;"));
        assert!(xml.contains(r#"TargetMode="External""#));
        assert_eq!(Relationships::parse(xml.as_bytes(), PART).unwrap(), rels);
    }
}
