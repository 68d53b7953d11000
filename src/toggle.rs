//! Optional slide groups gated by boolean flags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Flags supplied with a request: toggle group name → include.
pub type ToggleFlags = BTreeMap<String, bool>;

/// Named groups of 0-based slide positions. A position belongs to at most
/// one group; positions in no group are always kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, BTreeSet<usize>>", into = "BTreeMap<String, BTreeSet<usize>>")]
pub struct ToggleGroups {
    groups: BTreeMap<String, BTreeSet<usize>>,
}

impl ToggleGroups {
    /// Create an empty set of groups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group. Fails if a position is already claimed by another group.
    pub fn add<I>(&mut self, name: impl Into<String>, positions: I) -> Result<()>
    where
        I: IntoIterator<Item = usize>,
    {
        let name = name.into();
        let positions: BTreeSet<usize> = positions.into_iter().collect();

        for (other, members) in &self.groups {
            if *other == name {
                continue;
            }
            if let Some(shared) = members.intersection(&positions).next() {
                return Err(Error::Config(format!(
                    "slide {} is in both toggle groups '{}' and '{}'",
                    shared, other, name
                )));
            }
        }

        self.groups.entry(name).or_default().extend(positions);
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with<I>(mut self, name: impl Into<String>, positions: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        self.add(name, positions)?;
        Ok(self)
    }

    /// Positions of a group.
    pub fn get(&self, name: &str) -> Option<&BTreeSet<usize>> {
        self.groups.get(name)
    }

    /// Group names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Group a position belongs to, if any.
    pub fn group_of(&self, position: usize) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, members)| members.contains(&position))
            .map(|(name, _)| name.as_str())
    }

    /// Whether no groups are defined.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Positions to remove for a set of flags.
    ///
    /// A group is dropped only when its flag is present and false; a true or
    /// missing flag keeps it. Flags naming unknown groups are ignored.
    pub fn removals(&self, flags: &ToggleFlags) -> BTreeSet<usize> {
        let mut removals = BTreeSet::new();
        for (name, members) in &self.groups {
            if flags.get(name) == Some(&false) {
                debug!(group = %name, slides = ?members, "toggle group disabled");
                removals.extend(members.iter().copied());
            }
        }
        removals
    }
}

impl TryFrom<BTreeMap<String, BTreeSet<usize>>> for ToggleGroups {
    type Error = Error;

    fn try_from(map: BTreeMap<String, BTreeSet<usize>>) -> Result<Self> {
        let mut groups = ToggleGroups::new();
        for (name, positions) in map {
            groups.add(name, positions)?;
        }
        Ok(groups)
    }
}

impl From<ToggleGroups> for BTreeMap<String, BTreeSet<usize>> {
    fn from(groups: ToggleGroups) -> Self {
        groups.groups
    }
}
