//! Location lookup by id.

use commons_types::{Location, LocationId};
use std::collections::BTreeMap;

/// Map from location id to location, rebuilt whenever the catalog changes
///
/// Backed by an ordered map so the index hashes deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocationIndex {
    by_id: BTreeMap<LocationId, Location>,
}

impl LocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index; on duplicate ids the last location wins
    pub fn build<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Self {
        let by_id = locations
            .into_iter()
            .map(|location| (location.id.clone(), location.clone()))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl<'a> FromIterator<&'a Location> for LocationIndex {
    fn from_iter<I: IntoIterator<Item = &'a Location>>(iter: I) -> Self {
        Self::build(iter)
    }
}
