//! Package store for DOCX/DOTX files
//!
//! DOCX and DOTX files are ZIP archives of parts. A [`Package`] keeps every
//! part as raw bytes, keyed by its archive path, plus the bookkeeping that
//! ties them together: content types, the package relationships in
//! `_rels/.rels` and the main document's relationships.
//!
//! The content types part and both relationship parts are parsed on open
//! and regenerated on every write, so they never go stale.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::content_types::{ContentTypes, CONTENT_TYPES_PATH};
use crate::error::{OoxmlError, Result};
use crate::relationships::{rel_types, Relationships};

/// Package relationships part
pub const PACKAGE_RELS_PATH: &str = "_rels/.rels";

/// Main document part used when the package does not name one
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// An unpacked OOXML package
#[derive(Debug, Clone)]
pub struct Package {
    /// Raw parts keyed by archive path, generated parts excluded
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
    relationships: Relationships,
    document_relationships: Relationships,
    main_part: String,
}

/// `word/_rels/document.xml.rels` for `word/document.xml`
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

impl Package {
    /// An empty package whose main document lives at `main_part`
    pub fn new(main_part: &str) -> Self {
        let main_part = main_part.trim_start_matches('/').to_string();
        let mut relationships = Relationships::new();
        relationships.insert("rId1", rel_types::OFFICE_DOCUMENT, main_part.as_str());
        Self {
            parts: BTreeMap::new(),
            content_types: ContentTypes::for_document(&main_part),
            relationships,
            document_relationships: Relationships::new(),
            main_part,
        }
    }

    /// Open and unpack a DOCX/DOTX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            parts.insert(name, contents);
        }

        let content_types = match parts.remove(CONTENT_TYPES_PATH) {
            Some(xml) => ContentTypes::parse(&xml, CONTENT_TYPES_PATH)?,
            None => return Err(OoxmlError::MissingPart(CONTENT_TYPES_PATH.to_string())),
        };

        let relationships = match parts.remove(PACKAGE_RELS_PATH) {
            Some(xml) => Relationships::parse(&xml, PACKAGE_RELS_PATH)?,
            None => Relationships::new(),
        };

        let main_part = relationships
            .first_of_type(rel_types::OFFICE_DOCUMENT)
            .map(|rel| rel.target.trim_start_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let rels_path = rels_path_for(&main_part);
        let document_relationships = match parts.remove(&rels_path) {
            Some(xml) => Relationships::parse(&xml, &rels_path)?,
            None => Relationships::new(),
        };

        log::debug!(
            "unpacked {} parts, main part {}, {} document relationships",
            parts.len(),
            main_part,
            document_relationships.len()
        );

        Ok(Self {
            parts,
            content_types,
            relationships,
            document_relationships,
            main_part,
        })
    }

    /// Archive path of the main document part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Archive path of the main document's relationships part
    pub fn document_relationships_path(&self) -> String {
        rels_path_for(&self.main_part)
    }

    /// Get a part's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(|v| v.as_slice())
    }

    /// Get a part's contents as UTF-8 text
    pub fn get_str(&self, path: &str) -> Result<Option<&str>> {
        match self.parts.get(path) {
            Some(bytes) => std::str::from_utf8(bytes)
                .map(Some)
                .map_err(|_| OoxmlError::structure(path, "part is not valid UTF-8")),
            None => Ok(None),
        }
    }

    /// Set or replace a part's contents
    ///
    /// A new path also needs a content type, see
    /// [`register_content_type`](Self::register_content_type).
    pub fn put(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.parts.insert(path.into(), contents);
    }

    pub fn put_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.put(path, contents.into().into_bytes());
    }

    /// Remove a part and its content type override
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        let removed = self.parts.remove(path)?;
        self.content_types.remove_override(path);
        Some(removed)
    }

    /// Remove a part's bytes, keeping its content type
    ///
    /// Used for parts whose content is regenerated at write time.
    pub(crate) fn take(&mut self, path: &str) -> Option<Vec<u8>> {
        self.parts.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// Stored part paths in sorted order
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|s| s.as_str())
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Record an `Override` content type for one part
    pub fn register_content_type(&mut self, path: &str, content_type: &str) {
        self.content_types.add_override(path, content_type);
    }

    /// Record a `Default` content type for a file extension
    pub fn register_default(&mut self, extension: &str, content_type: &str) {
        self.content_types.add_default(extension, content_type);
    }

    /// Relationships in `_rels/.rels`
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Relationships of the main document part
    pub fn document_relationships(&self) -> &Relationships {
        &self.document_relationships
    }

    /// Smallest unused `rId{n}` among the package relationships
    pub fn next_package_relationship_id(&self) -> String {
        format!("rId{}", self.relationships.max_numeric_id().unwrap_or(0) + 1)
    }

    pub fn add_package_relationship(&mut self, id: &str, rel_type: &str, target: &str) {
        self.relationships.insert(id, rel_type, target);
    }

    /// Register a relationship of the main document part
    ///
    /// `id` should come from the document's
    /// [`IdAllocator`](crate::ids::IdAllocator). Targets are relative to the
    /// main part's folder.
    pub fn add_document_relationship(&mut self, id: &str, rel_type: &str, target: &str) {
        self.document_relationships.insert(id, rel_type, target);
    }

    pub fn remove_document_relationship(&mut self, id: &str) -> bool {
        self.document_relationships.remove(id).is_some()
    }

    /// Write the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the package to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        self.write_with(writer, BTreeMap::new())
    }

    /// Serialize the package into an in-memory archive
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write stored parts, overlaid by `generated` and the bookkeeping parts
    pub(crate) fn write_with<W: Write + Seek>(
        &self,
        writer: W,
        mut generated: BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        generated.insert(
            CONTENT_TYPES_PATH.to_string(),
            self.content_types.to_xml().into_bytes(),
        );
        generated.insert(
            PACKAGE_RELS_PATH.to_string(),
            self.relationships.to_xml().into_bytes(),
        );
        generated.insert(
            self.document_relationships_path(),
            self.document_relationships.to_xml().into_bytes(),
        );

        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        // Stored and generated paths merged in sorted order for deterministic output
        let mut paths: Vec<&String> = self.parts.keys().chain(generated.keys()).collect();
        paths.sort();
        paths.dedup();

        for path in paths {
            let contents = generated
                .get(path)
                .or_else(|| self.parts.get(path))
                .map(Vec::as_slice)
                .unwrap_or_default();
            zip.start_file(path.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        log::debug!("wrote package with main part {}", self.main_part);
        Ok(())
    }
}
