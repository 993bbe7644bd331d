//! The fixed-size list of shelves currently requested for delivery.

use rand::seq::SliceRandom;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::ShelfId;

/// Ordered slots of requested shelves. The slot count never changes during
/// an episode; a delivered shelf is replaced in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RequestQueue {
    slots: Vec<ShelfId>,
}

impl RequestQueue {
    /// Wraps an explicit list of distinct shelves.
    ///
    /// # Panics
    ///
    /// Panics if the list contains a shelf twice.
    pub fn from_slots(slots: Vec<ShelfId>) -> Self {
        for (i, id) in slots.iter().enumerate() {
            assert!(!slots[..i].contains(id), "{} requested twice", id);
        }
        Self { slots }
    }

    /// Draws `size` distinct shelves uniformly from `1..=shelf_count`.
    ///
    /// # Panics
    ///
    /// Panics if `size > shelf_count`.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, shelf_count: usize, size: usize) -> Self {
        assert!(size <= shelf_count, "cannot request {} of {} shelves", size, shelf_count);
        let ids: Vec<usize> = (1..=shelf_count).collect();
        let slots = ids
            .choose_multiple(rng, size)
            .map(|&raw| ShelfId::new(raw))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, shelf: ShelfId) -> bool {
        self.slots.contains(&shelf)
    }

    /// Slot holding `shelf`, if requested.
    pub fn slot_of(&self, shelf: ShelfId) -> Option<usize> {
        self.slots.iter().position(|&s| s == shelf)
    }

    pub fn slots(&self) -> &[ShelfId] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = ShelfId> + '_ {
        self.slots.iter().copied()
    }

    /// Picks a replacement uniformly among the shelves that are not
    /// currently requested, in ascending id order.
    ///
    /// # Panics
    ///
    /// Panics if every shelf is already requested.
    pub fn draw_replacement<R: Rng + ?Sized>(&self, rng: &mut R, shelf_count: usize) -> ShelfId {
        let candidates: Vec<ShelfId> = (1..=shelf_count)
            .map(ShelfId::new)
            .filter(|&id| !self.contains(id))
            .collect();
        assert!(
            !candidates.is_empty(),
            "no unrequested shelf left to draw a replacement from"
        );
        candidates[rng.gen_range(0..candidates.len())]
    }

    /// Replaces a delivered shelf with a freshly drawn one in the same slot.
    /// Returns the replacement.
    ///
    /// # Panics
    ///
    /// Panics if `delivered` is not requested.
    pub fn replace<R: Rng + ?Sized>(
        &mut self,
        delivered: ShelfId,
        rng: &mut R,
        shelf_count: usize,
    ) -> ShelfId {
        let slot = self
            .slot_of(delivered)
            .unwrap_or_else(|| panic!("{} is not requested", delivered));
        let replacement = self.draw_replacement(rng, shelf_count);
        self.slots[slot] = replacement;
        replacement
    }
}
