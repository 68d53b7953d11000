//! Template manifest: static metadata that travels with a template.
//!
//! ```json
//! {
//!   "name": "proposal",
//!   "toggle_groups": { "pricing": [2], "case_studies": [5, 6] }
//! }
//! ```

use crate::error::Result;
use crate::toggle::ToggleGroups;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata describing a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional slide groups, by 0-based slide position
    #[serde(default, skip_serializing_if = "ToggleGroups::is_empty")]
    pub toggle_groups: ToggleGroups,
}

impl TemplateManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the toggle groups.
    pub fn with_toggle_groups(mut self, groups: ToggleGroups) -> Self {
        self.toggle_groups = groups;
        self
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
