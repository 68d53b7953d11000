//! In-memory presentation container.
//!
//! A [`Deck`] owns the loaded [`Package`] plus two views over
//! `ppt/presentation.xml`:
//!
//! - an ordered list of slide handles, each indexing an arena of
//!   [`SlideRecord`]s (slide id and relationship id as authored), and
//! - the presentation relationship table, the side table that maps each
//!   relationship id to its slide part.
//!
//! Stages mutate the views; [`Deck::into_bytes`] writes them back into the
//! package, drops every part that lost its last reference, and serializes.

use crate::detect::detect_format;
use crate::error::{Error, Result};
use crate::package::{rels_path_for, resolve_path, Package, Relationships, CONTENT_TYPES};
use crate::replacements::find_tokens;
use crate::resolve::SlideText;
use crate::xml::{attr, filter_elements, prefixed_attr};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Opaque index of a slide record in the deck's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlideHandle(usize);

/// A slide as listed in `p:sldIdLst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideRecord {
    /// Numeric slide id (`id` attribute), unique within the presentation
    pub slide_id: String,
    /// Relationship id (`r:id` attribute) of the slide part
    pub rel_id: String,
}

/// Inspection view of one slide.
#[derive(Debug, Clone, Serialize)]
pub struct SlideSummary {
    /// 0-based position in the current slide order
    pub position: usize,
    /// Numeric slide id
    pub slide_id: String,
    /// Relationship id
    pub rel_id: String,
    /// Package part holding the slide
    pub part: String,
    /// Logical text of each paragraph
    pub paragraphs: Vec<String>,
}

/// A loaded presentation, owned by a single build.
pub struct Deck {
    pub(crate) package: Package,
    presentation_part: String,
    pub(crate) presentation_rels: Relationships,
    arena: Vec<SlideRecord>,
    pub(crate) order: Vec<SlideHandle>,
    pub(crate) removed: Vec<SlideHandle>,
    reachable_at_load: BTreeSet<String>,
}

impl Deck {
    /// Open a presentation from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())
            .map_err(|e| Error::TemplateLoad(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_bytes(&data)
    }

    /// Load a presentation from bytes.
    ///
    /// Any failure is reported as [`Error::TemplateLoad`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::load(data).map_err(|e| match e {
            Error::TemplateLoad(_) => e,
            other => Error::TemplateLoad(other.to_string()),
        })
    }

    fn load(data: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(data)?;

        let format = detect_format(&package)?;
        if !format.is_presentation() {
            return Err(Error::UnsupportedFormat(format!(
                "expected a presentation, found {}",
                format
            )));
        }

        let presentation_part = Self::find_presentation_part(&package)?;
        let presentation_rels = package.relationships(&presentation_part)?;
        let arena = Self::parse_slide_list(&package.read_xml(&presentation_part)?)?;
        let order = (0..arena.len()).map(SlideHandle).collect();
        let reachable_at_load = package.reachable_parts()?;

        debug!(
            part = %presentation_part,
            slides = arena.len(),
            parts = reachable_at_load.len(),
            "loaded presentation"
        );

        Ok(Self {
            package,
            presentation_part,
            presentation_rels,
            arena,
            order,
            removed: Vec::new(),
            reachable_at_load,
        })
    }

    /// Locate the main presentation part through the package relationships.
    fn find_presentation_part(package: &Package) -> Result<String> {
        let root = package.relationships("")?;
        let from_rels = root
            .iter()
            .find(|r| !r.external && r.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|r| resolve_path("", &r.target));

        match from_rels {
            Some(part) if package.contains(&part) => Ok(part),
            _ if package.contains(DEFAULT_PRESENTATION_PART) => {
                Ok(DEFAULT_PRESENTATION_PART.to_string())
            }
            _ => Err(Error::MissingComponent(DEFAULT_PRESENTATION_PART.to_string())),
        }
    }

    /// Read `p:sldId` entries (those carrying an `r:id`) in document order.
    /// An entry without an `id` is a [`Error::TemplateLoad`].
    fn parse_slide_list(xml: &str) -> Result<Vec<SlideRecord>> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut slides = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"sldId" => {
                    if let Some(rel_id) = prefixed_attr(&e, b"id") {
                        let slide_id = attr(&e, b"id").ok_or_else(|| {
                            Error::TemplateLoad(format!("slide entry {} has no id", rel_id))
                        })?;
                        slides.push(SlideRecord { slide_id, rel_id });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(slides)
    }

    /// Number of slides currently in the deck.
    pub fn slide_count(&self) -> usize {
        self.order.len()
    }

    /// Slide record at a 0-based position.
    pub fn slide(&self, position: usize) -> Option<&SlideRecord> {
        self.order.get(position).map(|h| self.record(*h))
    }

    pub(crate) fn record(&self, handle: SlideHandle) -> &SlideRecord {
        &self.arena[handle.0]
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Package part of the slide behind a handle, checked against the
    /// relationship table and the package.
    pub(crate) fn part_for(&self, handle: SlideHandle) -> Result<String> {
        let record = self.record(handle);
        let rel = self
            .presentation_rels
            .get(&record.rel_id)
            .ok_or_else(|| Error::DanglingRelationship {
                rel_id: record.rel_id.clone(),
                target: "<no such relationship>".to_string(),
            })?;

        let part = resolve_path(&self.presentation_part, &rel.target);
        if rel.external || !self.package.contains(&part) {
            return Err(Error::DanglingRelationship {
                rel_id: record.rel_id.clone(),
                target: rel.target.clone(),
            });
        }
        Ok(part)
    }

    /// Package part of the slide at a 0-based position.
    pub fn slide_part(&self, position: usize) -> Result<String> {
        let handle = self
            .order
            .get(position)
            .ok_or_else(|| Error::MissingComponent(format!("slide {}", position)))?;
        self.part_for(*handle)
    }

    /// Summaries of every slide in order.
    pub fn slides(&self) -> Result<Vec<SlideSummary>> {
        (0..self.slide_count())
            .map(|position| {
                let record = self.record(self.order[position]);
                let part = self.slide_part(position)?;
                let text = SlideText::parse(&self.package.read_xml(&part)?)?;
                Ok(SlideSummary {
                    position,
                    slide_id: record.slide_id.clone(),
                    rel_id: record.rel_id.clone(),
                    part,
                    paragraphs: text.paragraphs(),
                })
            })
            .collect()
    }

    /// Every delimited placeholder token found in the slide text.
    pub fn placeholders(&self) -> Result<BTreeSet<String>> {
        let mut found = BTreeSet::new();
        for slide in self.slides()? {
            for paragraph in &slide.paragraphs {
                found.extend(find_tokens(paragraph).into_iter().map(String::from));
            }
        }
        Ok(found)
    }

    /// Write the mutated views back into the package and serialize it.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if !self.removed.is_empty() {
            self.write_slide_list()?;
            self.write_presentation_rels()?;
            self.drop_unreachable_parts()?;
        }
        self.package.to_bytes()
    }

    /// Remove the `sldId` entries of removed slides from the slide list and
    /// from section lists, plus their custom show references.
    fn write_slide_list(&mut self) -> Result<()> {
        let removed_ids: BTreeSet<&str> = self
            .removed
            .iter()
            .map(|h| self.record(*h).slide_id.as_str())
            .collect();
        let removed_rels: BTreeSet<&str> = self
            .removed
            .iter()
            .map(|h| self.record(*h).rel_id.as_str())
            .collect();

        let xml = self.package.read_xml(&self.presentation_part)?;
        let (rewritten, dropped) = filter_elements(&xml, |e| match e.local_name().as_ref() {
            b"sldId" => {
                attr(e, b"id").is_none_or(|id| !removed_ids.contains(id.as_str()))
                    && prefixed_attr(e, b"id").is_none_or(|id| !removed_rels.contains(id.as_str()))
            }
            b"sld" => prefixed_attr(e, b"id").is_none_or(|id| !removed_rels.contains(id.as_str())),
            _ => true,
        })?;

        debug!(entries = dropped, "rewrote slide list");
        let part = self.presentation_part.clone();
        self.package.replace(&part, rewritten.into_bytes())
    }

    /// Keep only the relationships still present in the side table.
    fn write_presentation_rels(&mut self) -> Result<()> {
        let rels_path = rels_path_for(&self.presentation_part);
        let xml = self.package.read_xml(&rels_path)?;
        let table = &self.presentation_rels;
        let (rewritten, _) = filter_elements(&xml, |e| {
            e.local_name().as_ref() != b"Relationship"
                || attr(e, b"Id").is_some_and(|id| table.contains(&id))
        })?;
        self.package.replace(&rels_path, rewritten.into_bytes())
    }

    /// Drop every part that was reachable at load time and no longer is,
    /// together with its .rels part and content type override.
    fn drop_unreachable_parts(&mut self) -> Result<()> {
        let reachable = self.package.reachable_parts()?;
        let orphaned: BTreeSet<String> = self
            .reachable_at_load
            .difference(&reachable)
            .cloned()
            .collect();
        if orphaned.is_empty() {
            return Ok(());
        }

        let overrides: BTreeSet<String> = orphaned.iter().map(|p| format!("/{}", p)).collect();
        let xml = self.package.read_xml(CONTENT_TYPES)?;
        let (rewritten, _) = filter_elements(&xml, |e| {
            e.local_name().as_ref() != b"Override"
                || attr(e, b"PartName").is_none_or(|name| !overrides.contains(&name))
        })?;
        self.package.replace(CONTENT_TYPES, rewritten.into_bytes())?;

        let mut doomed = orphaned.clone();
        doomed.extend(
            orphaned
                .iter()
                .map(|p| rels_path_for(p))
                .filter(|r| self.package.contains(r)),
        );

        debug!(parts = ?doomed, "dropping unreferenced parts");
        self.package.remove_all(&doomed);
        Ok(())
    }
}

impl std::fmt::Debug for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deck")
            .field("slides", &self.order.len())
            .field("removed", &self.removed.len())
            .field("package", &self.package)
            .finish()
    }
}
