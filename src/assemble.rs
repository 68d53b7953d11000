//! Build pipeline: toggles and removals, pruning, placeholder resolution,
//! serialization.

use crate::deck::Deck;
use crate::error::Result;
use crate::manifest::TemplateManifest;
use crate::replacements::{ReplacementMap, ReplacementValue};
use crate::toggle::{ToggleFlags, ToggleGroups};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build a presentation from template bytes.
///
/// The removal set is `removals` plus every slide of a toggle group whose
/// flag is false. Slides are pruned first, then placeholders are resolved
/// on the slides that remain. The template bytes are only read.
pub fn build(
    template: &[u8],
    groups: &ToggleGroups,
    replacements: &ReplacementMap,
    toggles: &ToggleFlags,
    removals: &BTreeSet<usize>,
) -> Result<Vec<u8>> {
    replacements.validate()?;
    let mut deck = Deck::from_bytes(template)?;

    let mut effective = removals.clone();
    effective.extend(groups.removals(toggles));

    let removed = deck.prune(effective.iter().copied())?;
    let substitutions = deck.resolve(replacements)?;
    let slides = deck.slide_count();
    let bytes = deck.into_bytes()?;

    info!(
        removed,
        slides,
        substitutions,
        bytes = bytes.len(),
        "built presentation"
    );
    Ok(bytes)
}

/// Per-request inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Token → replacement
    #[serde(default)]
    pub replacements: ReplacementMap,

    /// Toggle group flags
    #[serde(default)]
    pub toggles: ToggleFlags,

    /// Explicit 0-based slide positions to remove
    #[serde(default)]
    pub removals: BTreeSet<usize>,
}

impl BuildRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a request from JSON text:
    /// `{"replacements": {...}, "toggles": {...}, "removals": [...]}`.
    ///
    /// Replacement values go through [`ReplacementMap::from_json`], so a
    /// non-scalar value is an
    /// [`InvalidReplacementValue`](crate::Error::InvalidReplacementValue).
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        let replacements = value
            .as_object_mut()
            .and_then(|object| object.remove("replacements"));

        let mut request: BuildRequest = serde_json::from_value(value)?;
        if let Some(replacements) = replacements {
            request.replacements = ReplacementMap::from_json(&replacements)?;
        }
        Ok(request)
    }

    /// Set all replacements.
    pub fn with_replacements(mut self, replacements: ReplacementMap) -> Self {
        self.replacements = replacements;
        self
    }

    /// Add one replacement.
    pub fn with_replacement(
        mut self,
        token: impl Into<String>,
        value: impl Into<ReplacementValue>,
    ) -> Self {
        self.replacements.insert(token, value);
        self
    }

    /// Set one toggle flag.
    pub fn with_toggle(mut self, group: impl Into<String>, include: bool) -> Self {
        self.toggles.insert(group.into(), include);
        self
    }

    /// Merge toggle flags.
    pub fn with_toggles(mut self, toggles: ToggleFlags) -> Self {
        self.toggles.extend(toggles);
        self
    }

    /// Remove a slide by 0-based position.
    pub fn remove_slide(mut self, position: usize) -> Self {
        self.removals.insert(position);
        self
    }

    /// Remove several slides by 0-based position.
    pub fn remove_slides(mut self, positions: impl IntoIterator<Item = usize>) -> Self {
        self.removals.extend(positions);
        self
    }
}

/// A template loaded once and shared across builds.
///
/// Cloning is cheap; every [`build`](Template::build) parses a fresh
/// [`Deck`] from the shared bytes.
#[derive(Debug, Clone)]
pub struct Template {
    bytes: Arc<[u8]>,
    manifest: Arc<TemplateManifest>,
}

impl Template {
    /// Load and validate a template file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            crate::Error::TemplateLoad(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    /// Load and validate a template file asynchronously.
    #[cfg(feature = "async")]
    pub async fn open_async(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await.map_err(|e| {
            crate::Error::TemplateLoad(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_bytes(bytes)
    }

    /// Validate template bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        Deck::from_bytes(&bytes)?;
        Ok(Self {
            bytes,
            manifest: Arc::new(TemplateManifest::default()),
        })
    }

    /// Attach a manifest.
    pub fn with_manifest(mut self, manifest: TemplateManifest) -> Self {
        self.manifest = Arc::new(manifest);
        self
    }

    /// The template manifest.
    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    /// Raw template bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parse a fresh deck for inspection.
    pub fn deck(&self) -> Result<Deck> {
        Deck::from_bytes(&self.bytes)
    }

    /// Build a presentation for one request.
    pub fn build(&self, request: &BuildRequest) -> Result<Vec<u8>> {
        build(
            &self.bytes,
            &self.manifest.toggle_groups,
            &request.replacements,
            &request.toggles,
            &request.removals,
        )
    }
}
