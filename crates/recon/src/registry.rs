use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

use crate::model::{Attributes, Individual};

/// Canonical animals keyed by animal id, iterated in ascending id order.
///
/// Single writer: every merge goes through `&mut self`, so concurrent merges
/// on the same key are serialized by construction.
#[derive(Debug, Default)]
pub struct Registry {
    animals: BTreeMap<String, Individual>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `candidate` if its id is new, otherwise merge it into the
    /// existing record. Returns the canonical record, which is the one events
    /// must be attached to.
    pub fn resolve(&mut self, candidate: Individual) -> &mut Individual {
        match self.animals.entry(candidate.animal_id.clone()) {
            Entry::Vacant(slot) => slot.insert(candidate),
            Entry::Occupied(slot) => {
                let existing = slot.into_mut();
                existing.update_if_newer(candidate);
                existing
            }
        }
    }

    pub fn get(&self, animal_id: &str) -> Option<&Individual> {
        self.animals.get(animal_id)
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, Individual> {
        self.animals.values()
    }

    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, String, Individual> {
        self.animals.values_mut()
    }
}

impl Individual {
    /// Merge a newer observation of this animal.
    ///
    /// Attributes merge only when `candidate` is strictly newer; a known
    /// candidate value overwrites, an unknown one never does. Any events the
    /// candidate carries are appended either way. Returns whether the
    /// attribute merge was accepted.
    pub fn update_if_newer(&mut self, candidate: Individual) -> bool {
        let Individual {
            timestamp,
            attributes,
            intakes,
            outcomes,
            ..
        } = candidate;

        self.intakes.extend(intakes);
        self.outcomes.extend(outcomes);

        if timestamp <= self.timestamp {
            return false;
        }

        self.attributes.merge_known(attributes);
        self.timestamp = timestamp;
        true
    }
}

impl Attributes {
    /// Overwrite each field for which `newer` holds a known value.
    pub fn merge_known(&mut self, newer: Attributes) {
        overwrite_if_known(&mut self.kind, newer.kind);
        overwrite_if_known(&mut self.sex, newer.sex);
        overwrite_if_known(&mut self.name, newer.name);
        overwrite_if_known(&mut self.color1, newer.color1);
        overwrite_if_known(&mut self.color2, newer.color2);
        overwrite_if_known(&mut self.breed1, newer.breed1);
        overwrite_if_known(&mut self.breed2, newer.breed2);
    }
}

fn overwrite_if_known<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}
