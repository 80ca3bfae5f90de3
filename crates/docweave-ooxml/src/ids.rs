//! Per-document identifier allocation
//!
//! Every OOXML part that cross-references another one does so through a
//! numeric or `rId` identifier. Each [`Document`](crate::Document) owns one
//! [`IdAllocator`]; feature modules draw fresh ids from it instead of keeping
//! counters of their own.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::xml::attr_num;

/// The independent id spaces of a word processing package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdNamespace {
    /// `rId{n}` entries in `word/_rels/document.xml.rels`
    Relationship,
    /// `w:footnote/@w:id`
    Footnote,
    /// `w:endnote/@w:id`
    Endnote,
    /// `w:bookmarkStart/@w:id`
    Bookmark,
    /// `w:num/@w:numId`
    Numbering,
    /// `w:abstractNum/@w:abstractNumId`
    AbstractNumbering,
    /// `wp:docPr/@id` on drawings
    Drawing,
}

impl IdNamespace {
    /// First id handed out in this namespace
    ///
    /// Footnote and endnote ids 0 and -1 are taken by Word's separator
    /// notes, so user notes start at 1. Abstract numbering and bookmarks are
    /// zero-based.
    fn first(self) -> u32 {
        match self {
            IdNamespace::Bookmark | IdNamespace::AbstractNumbering => 0,
            _ => 1,
        }
    }
}

/// Issues strictly increasing ids per [`IdNamespace`]
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    /// Next free id; `None` once `u32::MAX` has been issued or observed
    next: HashMap<IdNamespace, Option<u32>>,
}

impl IdAllocator {
    /// Create an allocator with every namespace at its starting id
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, namespace: IdNamespace) -> &mut Option<u32> {
        self.next
            .entry(namespace)
            .or_insert_with(|| Some(namespace.first()))
    }

    /// Hand out the next id in `namespace`
    ///
    /// Fails with [`OoxmlError::IdsExhausted`] once the namespace has used
    /// `u32::MAX`; ids are never reissued.
    pub fn next(&mut self, namespace: IdNamespace) -> Result<u32> {
        let slot = self.slot(namespace);
        let id = (*slot).ok_or(OoxmlError::IdsExhausted(namespace))?;
        *slot = id.checked_add(1);
        Ok(id)
    }

    /// Hand out the next relationship id, formatted as `rId{n}`
    pub fn next_relationship_id(&mut self) -> Result<String> {
        Ok(format!("rId{}", self.next(IdNamespace::Relationship)?))
    }

    /// Record an id that already exists so it is never handed out
    pub fn observe(&mut self, namespace: IdNamespace, id: u32) {
        let slot = self.slot(namespace);
        let Some(next) = *slot else { return };
        if id >= next {
            *slot = id.checked_add(1);
            if slot.is_none() {
                log::warn!(
                    "{:?} id {} is in use; no further {:?} ids can be allocated",
                    namespace,
                    id,
                    namespace
                );
            }
        }
    }

    /// Record a relationship id such as `rId7`; other shapes are ignored
    pub fn observe_relationship_id(&mut self, id: &str) {
        if let Some(n) = relationship_number(id) {
            self.observe(IdNamespace::Relationship, n);
        }
    }

    /// Record every id declared or referenced in the XML part `xml`
    ///
    /// Covers bookmarks, note references and definitions, numbering
    /// definitions and drawing properties wherever they are nested, so ids
    /// inside markup the body model does not keep are observed too.
    pub fn observe_part(&mut self, xml: &[u8], part: &str) -> Result<()> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => self.observe_element(e),
                Ok(Event::Eof) => return Ok(()),
                Err(e) => return Err(OoxmlError::xml(part, e)),
                _ => {}
            }
            buf.clear();
        }
    }

    fn observe_element(&mut self, e: &BytesStart) {
        let (namespace, attribute) = match e.local_name().as_ref() {
            b"bookmarkStart" | b"bookmarkEnd" => (IdNamespace::Bookmark, "id"),
            b"footnote" | b"footnoteReference" => (IdNamespace::Footnote, "id"),
            b"endnote" | b"endnoteReference" => (IdNamespace::Endnote, "id"),
            b"num" => (IdNamespace::Numbering, "numId"),
            b"abstractNum" => (IdNamespace::AbstractNumbering, "abstractNumId"),
            b"docPr" => (IdNamespace::Drawing, "id"),
            _ => return,
        };
        // separator notes use negative ids, which never collide
        if let Some(id) = attr_num::<u32>(e, attribute.as_bytes()) {
            self.observe(namespace, id);
        }
    }

    /// The id the next call to [`next`](Self::next) would return, or `None`
    /// when the namespace is exhausted
    pub fn peek(&self, namespace: IdNamespace) -> Option<u32> {
        self.next
            .get(&namespace)
            .copied()
            .unwrap_or(Some(namespace.first()))
    }
}

/// Extract the numeric portion from a relationship ID (e.g., "rId5" -> 5)
pub(crate) fn relationship_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId")
        .or_else(|| id.strip_prefix("RId"))
        .or_else(|| id.strip_prefix("rid"))
        .and_then(|num| num.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids_are_distinct() {
        let mut ids = IdAllocator::new();
        let issued: HashSet<u32> = (0..500)
            .map(|_| ids.next(IdNamespace::Footnote).unwrap())
            .collect();
        assert_eq!(issued.len(), 500);
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next(IdNamespace::Footnote).unwrap(), 1);
        assert_eq!(ids.next(IdNamespace::Footnote).unwrap(), 2);
        assert_eq!(ids.next(IdNamespace::Endnote).unwrap(), 1);
        assert_eq!(ids.next(IdNamespace::Bookmark).unwrap(), 0);
        assert_eq!(ids.next(IdNamespace::Bookmark).unwrap(), 1);
        assert_eq!(ids.next(IdNamespace::Footnote).unwrap(), 3);
    }

    #[test]
    fn test_relationship_ids() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_relationship_id().unwrap(), "rId1");
        assert_eq!(ids.next_relationship_id().unwrap(), "rId2");
    }

    #[test]
    fn test_observe_skips_existing() {
        let mut ids = IdAllocator::new();
        ids.observe_relationship_id("rId5");
        ids.observe_relationship_id("rId3");
        ids.observe_relationship_id("custom");
        assert_eq!(ids.next_relationship_id().unwrap(), "rId6");

        ids.observe(IdNamespace::Numbering, 0);
        assert_eq!(ids.peek(IdNamespace::Numbering), Some(1));
    }

    #[test]
    fn test_observing_max_id_exhausts_namespace() {
        let mut ids = IdAllocator::new();
        ids.observe(IdNamespace::Bookmark, u32::MAX);
        assert_eq!(ids.peek(IdNamespace::Bookmark), None);
        assert!(matches!(
            ids.next(IdNamespace::Bookmark),
            Err(OoxmlError::IdsExhausted(IdNamespace::Bookmark))
        ));

        // lower ids seen later change nothing, other namespaces still work
        ids.observe(IdNamespace::Bookmark, 7);
        assert!(ids.next(IdNamespace::Bookmark).is_err());
        assert_eq!(ids.next(IdNamespace::Footnote).unwrap(), 1);
    }

    #[test]
    fn test_last_id_is_issued_once() {
        let mut ids = IdAllocator::new();
        ids.observe(IdNamespace::Drawing, u32::MAX - 1);
        assert_eq!(ids.next(IdNamespace::Drawing).unwrap(), u32::MAX);
        assert!(ids.next(IdNamespace::Drawing).is_err());
    }

    #[test]
    fn test_observe_part_finds_nested_ids() {
        let xml = br#"<w:footnotes xmlns:w="w">
            <w:footnote w:id="-1"/><w:footnote w:id="0"/>
            <w:footnote w:id="5"><w:p><w:bookmarkStart w:id="9" w:name="n"/></w:p></w:footnote>
        </w:footnotes>"#;
        let mut ids = IdAllocator::new();
        ids.observe_part(xml, "word/footnotes.xml").unwrap();
        assert_eq!(ids.peek(IdNamespace::Footnote), Some(6));
        assert_eq!(ids.peek(IdNamespace::Bookmark), Some(10));

        let numbering = br#"<w:numbering xmlns:w="w"><w:abstractNum w:abstractNumId="3"/><w:num w:numId="4"/></w:numbering>"#;
        ids.observe_part(numbering, "word/numbering.xml").unwrap();
        assert_eq!(ids.next(IdNamespace::Numbering).unwrap(), 5);
        assert_eq!(ids.next(IdNamespace::AbstractNumbering).unwrap(), 4);
    }

    #[test]
    fn test_observe_part_names_part_on_bad_xml() {
        let err = IdAllocator::new()
            .observe_part(b"<a></b>", "word/endnotes.xml")
            .unwrap_err();
        assert!(err.to_string().contains("word/endnotes.xml"), "got: {}", err);
    }

    #[test]
    fn test_relationship_number() {
        assert_eq!(relationship_number("rId12"), Some(12));
        assert_eq!(relationship_number("RId3"), Some(3));
        assert_eq!(relationship_number("image1"), None);
    }
}
