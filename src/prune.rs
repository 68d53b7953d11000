//! Slide pruning.

use crate::deck::Deck;
use crate::error::Result;
use std::collections::BTreeSet;
use tracing::{debug, info};

impl Deck {
    /// Remove the slides at the given 0-based positions.
    ///
    /// Positions at or past the current slide count are ignored rather than
    /// rejected: removal sets are often computed against an assumed template
    /// length. Duplicates are ignored too.
    ///
    /// Every surviving target is checked before anything is mutated, so a
    /// [`DanglingRelationship`](crate::Error::DanglingRelationship) leaves
    /// the deck unchanged. Removal then runs from the highest position down,
    /// which keeps the positions still pending valid. The remaining slides
    /// keep their relative order.
    ///
    /// Returns the number of slides removed.
    pub fn prune<I>(&mut self, positions: I) -> Result<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let count = self.slide_count();
        let requested: BTreeSet<usize> = positions.into_iter().collect();
        let (valid, ignored): (Vec<usize>, Vec<usize>) =
            requested.into_iter().partition(|&p| p < count);

        if !ignored.is_empty() {
            debug!(?ignored, slides = count, "ignoring out-of-range slide positions");
        }

        for &position in &valid {
            self.part_for(self.order[position])?;
        }

        for &position in valid.iter().rev() {
            let handle = self.order[position];
            let rel_id = self.record(handle).rel_id.clone();
            let rel = self.presentation_rels.detach(&rel_id)?;
            self.order.remove(position);
            self.removed.push(handle);
            debug!(position, rel_id = %rel_id, target = %rel.target, "removed slide");
        }

        if !valid.is_empty() {
            info!(removed = valid.len(), remaining = self.slide_count(), "pruned slides");
        }
        Ok(valid.len())
    }
}
