//! Region partitions over the ordered place list, and reordering inside one of them.

use shared::domain::{CategoryType, Place, Region};

use crate::error::ReorderError;

/// A drag inside the region view: both ends are named by region and index within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMove {
    pub source_region: Region,
    pub source_index: usize,
    pub destination_region: Region,
    pub destination_index: usize,
}

impl RegionMove {
    pub fn within(region: Region, source_index: usize, destination_index: usize) -> Self {
        Self {
            source_region: region.clone(),
            source_index,
            destination_region: region,
            destination_index,
        }
    }
}

/// Computes the full sequence after moving one place inside its region.
///
/// The result lists every place outside the region in its prior order, followed
/// by the region's places in their new order. A move inside a region therefore
/// always relocates that region's block to the end of the sequence.
pub fn plan_region_move(places: &[Place], mv: &RegionMove) -> Result<Vec<Place>, ReorderError> {
    if mv.destination_region != mv.source_region {
        return Err(ReorderError::CrossRegion {
            from: mv.source_region.clone(),
            to: mv.destination_region.clone(),
        });
    }

    let (mut group, mut sequence): (Vec<Place>, Vec<Place>) = places
        .iter()
        .cloned()
        .partition(|place| place.region == mv.source_region);

    for index in [mv.source_index, mv.destination_index] {
        if index >= group.len() {
            return Err(ReorderError::IndexOutOfRange {
                region: mv.source_region.clone(),
                index,
                len: group.len(),
            });
        }
    }

    let moved = group.remove(mv.source_index);
    group.insert(mv.destination_index, moved);

    sequence.extend(group);
    Ok(sequence)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionGroup<'a> {
    pub region: &'a Region,
    pub places: Vec<&'a Place>,
}

/// Groups in order of first appearance; members keep their sequence order.
pub fn group_by_region<'a>(places: impl IntoIterator<Item = &'a Place>) -> Vec<RegionGroup<'a>> {
    let mut groups: Vec<RegionGroup<'a>> = Vec::new();
    for place in places {
        match groups.iter_mut().find(|group| *group.region == place.region) {
            Some(group) => group.places.push(place),
            None => groups.push(RegionGroup {
                region: &place.region,
                places: vec![place],
            }),
        }
    }
    groups
}

/// Display filter; `None` on either axis means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceFilter {
    pub region: Option<Region>,
    pub category: Option<CategoryType>,
}

impl PlaceFilter {
    pub fn matches(&self, place: &Place) -> bool {
        self.region.as_ref().map_or(true, |r| *r == place.region)
            && self.category.map_or(true, |c| c == place.category_type)
    }

    pub fn apply<'a>(&'a self, places: &'a [Place]) -> impl Iterator<Item = &'a Place> + 'a {
        places.iter().filter(move |place| self.matches(place))
    }
}

/// Distinct regions, sorted, for filter choices.
pub fn distinct_regions(places: &[Place]) -> Vec<Region> {
    let mut regions: Vec<Region> = places.iter().map(|p| p.region.clone()).collect();
    regions.sort();
    regions.dedup();
    regions
}

#[cfg(test)]
#[path = "tests/regions_tests.rs"]
mod tests;
