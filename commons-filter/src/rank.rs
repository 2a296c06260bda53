//! Distance ranking against a reference coordinate.

use crate::geo::distance;
use crate::index::LocationIndex;
use commons_types::{Common, Coordinate, FilterCriteria};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The point results are ranked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferencePoint {
    UserLocation(Coordinate),
    MapCenter(Coordinate),
}

impl ReferencePoint {
    /// User position first, map center second, otherwise no ranking
    pub fn select(criteria: &FilterCriteria) -> Option<Self> {
        criteria
            .user_location
            .map(ReferencePoint::UserLocation)
            .or(criteria.map_center.map(ReferencePoint::MapCenter))
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            ReferencePoint::UserLocation(c) | ReferencePoint::MapCenter(c) => *c,
        }
    }
}

/// Secondary ordering for commons at equal distance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Keep catalog order
    #[default]
    CatalogOrder,
    /// Order by common id
    Id,
}

/// Comparator by distance from `reference`
///
/// Returns `Equal` whenever either common's location cannot be resolved.
/// That makes the relation non-transitive once unresolved commons are
/// present, so do not hand it to a sort directly; use [`sort_by_distance`].
pub fn rank_by_distance<'a>(
    reference: Coordinate,
    index: &'a LocationIndex,
) -> impl Fn(&Common, &Common) -> Ordering + 'a {
    move |a: &Common, b: &Common| {
        let (Some(location_a), Some(location_b)) =
            (index.get(&a.location_id), index.get(&b.location_id))
        else {
            return Ordering::Equal;
        };
        let distance_a = distance(reference, location_a.coordinates);
        let distance_b = distance(reference, location_b.coordinates);
        distance_a.total_cmp(&distance_b)
    }
}

/// Stable in-place ranking by distance
///
/// Only commons whose location resolves are reordered, and only among the
/// positions they already occupy; unresolved commons never move.
pub fn sort_by_distance(
    commons: &mut [Common],
    reference: Coordinate,
    index: &LocationIndex,
    tie_break: TieBreak,
) {
    let mut resolved: Vec<(usize, f64)> = commons
        .iter()
        .enumerate()
        .filter_map(|(position, common)| {
            index
                .get(&common.location_id)
                .map(|location| (position, distance(reference, location.coordinates)))
        })
        .collect();

    let unresolved = commons.len() - resolved.len();
    if unresolved > 0 {
        tracing::debug!(unresolved, "commons without a resolvable location keep their position");
    }

    let slots: Vec<usize> = resolved.iter().map(|(position, _)| *position).collect();
    resolved.sort_by(|(pos_a, dist_a), (pos_b, dist_b)| {
        dist_a.total_cmp(dist_b).then_with(|| match tie_break {
            TieBreak::CatalogOrder => Ordering::Equal,
            TieBreak::Id => commons[*pos_a].id.cmp(&commons[*pos_b].id),
        })
    });

    let ranked: Vec<Common> = resolved
        .iter()
        .map(|(position, _)| commons[*position].clone())
        .collect();
    for (slot, common) in slots.into_iter().zip(ranked) {
        commons[slot] = common;
    }
}
