//! ZIP package abstraction for OOXML presentations.
//!
//! A [`Package`] holds every part of the archive in memory, in archive order,
//! together with the compression method and timestamp it was stored with.
//! Serialization writes the parts back in the same order with the same
//! metadata, so untouched parts keep their bytes and repeated builds are
//! byte-identical.

use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Package-level relationships part.
pub const PACKAGE_RELS: &str = "_rels/.rels";

/// Content types part.
pub const CONTENT_TYPES: &str = "[Content_Types].xml";

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Collection of relationships parsed from a .rels file.
///
/// Keeps document order so a rewritten .rels part lists the surviving
/// relationships in their original sequence.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    /// Map from relationship ID to relationship data
    pub by_id: HashMap<String, Relationship>,
    /// Relationship IDs in document order
    order: Vec<String>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the XML of a .rels part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Relationships::new();
        if xml.trim().is_empty() {
            return Ok(rels);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Type" => rel_type = value,
                            b"Target" => target = value,
                            b"TargetMode" => external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }

                    if !id.is_empty() {
                        rels.add(Relationship {
                            id,
                            rel_type,
                            target,
                            external,
                        });
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Check whether a relationship ID is present.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Iterate relationships in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Add a relationship. A relationship with the same ID is replaced in place.
    pub fn add(&mut self, rel: Relationship) {
        if !self.by_id.contains_key(&rel.id) {
            self.order.push(rel.id.clone());
        }
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Remove a relationship and return it.
    ///
    /// Detaching an ID that is not in the table is a
    /// [`Error::DanglingRelationship`]: the caller holds a reference that
    /// the package cannot resolve.
    pub fn detach(&mut self, id: &str) -> Result<Relationship> {
        let rel = self
            .by_id
            .remove(id)
            .ok_or_else(|| Error::DanglingRelationship {
                rel_id: id.to_string(),
                target: "<no such relationship>".to_string(),
            })?;
        self.order.retain(|existing| existing != id);
        Ok(rel)
    }
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// When we decode UTF-16 XML to a Rust String (UTF-8), the XML declaration
/// still says encoding="UTF-16". A part rewritten from that string is UTF-8,
/// so the declaration has to agree.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
///
/// OOXML files are typically UTF-8 encoded, but some (especially older
/// or non-standard documents) may use UTF-16 encoding.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    // UTF-8 BOM: EF BB BF
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    // UTF-16 LE BOM: FF FE
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let content = decode_utf16_le(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    // UTF-16 BE BOM: FE FF
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let content = decode_utf16_be(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // UTF-16 LE typically has null bytes in odd positions for ASCII
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16_le(bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16_be(bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn decode_utf16_le(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;
    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_le_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn decode_utf16_be(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;
    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_be_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Path of the .rels part holding the relationships of `part`.
///
/// The empty string stands for the package itself.
pub fn rels_path_for(part: &str) -> String {
    if part.is_empty() || part == "/" {
        return PACKAGE_RELS.to_string();
    }
    match part.rfind('/') {
        Some(slash) => format!("{}/_rels/{}.rels", &part[..slash], &part[slash + 1..]),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relative path from a base part path.
pub fn resolve_path(base: &str, relative: &str) -> String {
    if let Some(stripped) = relative.strip_prefix('/') {
        return stripped.to_string();
    }

    let base_path = Path::new(base);
    let base_dir = base_path.parent().unwrap_or(Path::new(""));

    let mut result = base_dir.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            std::path::Component::ParentDir => {
                result.pop();
            }
            std::path::Component::Normal(c) => {
                result.push(c);
            }
            _ => {}
        }
    }

    result.to_string_lossy().replace('\\', "/")
}

/// One stored part of the archive.
#[derive(Clone)]
struct PartEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    modified: DateTime,
    is_dir: bool,
}

/// In-memory OOXML package.
#[derive(Clone)]
pub struct Package {
    entries: Vec<PartEntry>,
    index: HashMap<String, usize>,
}

impl Package {
    /// Read every part of a ZIP archive into memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            entries.push(PartEntry {
                name: file.name().to_string(),
                data: bytes,
                compression: file.compression(),
                modified: file.last_modified().unwrap_or_default(),
                is_dir: file.is_dir(),
            });
        }

        let mut package = Self {
            entries,
            index: HashMap::new(),
        };
        package.reindex();
        Ok(package)
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
    }

    /// Check if a part exists in the package.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// List all part names, in archive order.
    pub fn part_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// List parts matching a prefix.
    pub fn part_names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.name.starts_with(prefix))
            .map(|e| e.name.clone())
            .collect()
    }

    /// Read a part as raw bytes.
    pub fn read_binary(&self, name: &str) -> Result<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].data.as_slice())
            .ok_or_else(|| Error::MissingComponent(name.to_string()))
    }

    /// Read an XML part as a string, handling UTF-8 and UTF-16 encodings.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        decode_xml_bytes(self.read_binary(name)?)
    }

    /// Replace the content of an existing part.
    pub fn replace(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| Error::MissingComponent(name.to_string()))?;
        self.entries[i].data = data;
        Ok(())
    }

    /// Remove a set of parts. Unknown names are ignored.
    pub fn remove_all(&mut self, names: &BTreeSet<String>) {
        if names.is_empty() {
            return;
        }
        self.entries.retain(|e| !names.contains(&e.name));
        self.reindex();
    }

    /// Read the relationships of a part; the empty string reads the
    /// package relationships. A part without a .rels part has none.
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part);
        if !self.contains(&rels_path) {
            return Ok(Relationships::new());
        }
        Relationships::parse(&self.read_xml(&rels_path)?)
    }

    /// Collect every part reachable from the package relationships by
    /// following internal relationships.
    pub fn reachable_parts(&self) -> Result<BTreeSet<String>> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([String::new()]);

        while let Some(source) = queue.pop_front() {
            for rel in self.relationships(&source)?.iter() {
                if rel.external {
                    continue;
                }
                let target = resolve_path(&source, &rel.target);
                if self.contains(&target) && seen.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }

        Ok(seen)
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default()
                .compression_method(compression)
                .last_modified_time(entry.modified);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.entries.len())
            .finish()
    }
}
