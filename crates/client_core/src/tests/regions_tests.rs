use super::*;
use shared::domain::{Coordinate, Enrichment, PlaceId};

fn place(id: &str, region: &str) -> Place {
    Place {
        id: PlaceId::new(id),
        name: format!("place {id}"),
        raw_category: String::new(),
        category_type: CategoryType::Other,
        address: format!("{region} 어딘가"),
        normalized_address: String::new(),
        coordinate: Coordinate::FALLBACK,
        comment: String::new(),
        region: Region::new(region),
        link: None,
        enrichment: Enrichment::default(),
    }
}

fn ids(places: &[Place]) -> Vec<&str> {
    places.iter().map(|p| p.id.as_str()).collect()
}

fn sorted_ids(places: &[Place]) -> Vec<String> {
    let mut ids: Vec<String> = places.iter().map(|p| p.id.0.clone()).collect();
    ids.sort();
    ids
}

#[test]
fn moving_inside_a_region_relocates_its_block_to_the_end() {
    let places = vec![place("A", "X"), place("B", "X"), place("C", "Y")];
    let next = plan_region_move(&places, &RegionMove::within(Region::new("X"), 1, 0))
        .expect("same-region move");
    assert_eq!(ids(&next), ["C", "B", "A"]);
}

#[test]
fn no_op_move_still_relocates_the_block() {
    let places = vec![place("A", "X"), place("C", "Y"), place("B", "X")];
    let next = plan_region_move(&places, &RegionMove::within(Region::new("X"), 0, 0))
        .expect("same-region move");
    assert_eq!(ids(&next), ["C", "A", "B"]);
}

#[test]
fn other_regions_keep_their_relative_order() {
    let places = vec![
        place("y1", "Y"),
        place("x1", "X"),
        place("z1", "Z"),
        place("x2", "X"),
        place("y2", "Y"),
        place("x3", "X"),
    ];
    let next = plan_region_move(&places, &RegionMove::within(Region::new("X"), 0, 2))
        .expect("same-region move");
    assert_eq!(ids(&next), ["y1", "z1", "y2", "x2", "x3", "x1"]);
}

#[test]
fn every_valid_move_preserves_the_id_multiset() {
    let places = vec![
        place("a", "X"),
        place("b", "Y"),
        place("c", "X"),
        place("d", "X"),
        place("e", "Y"),
    ];
    let before = sorted_ids(&places);
    for region in ["X", "Y"] {
        let len = places.iter().filter(|p| p.region.as_str() == region).count();
        for from in 0..len {
            for to in 0..len {
                let next =
                    plan_region_move(&places, &RegionMove::within(Region::new(region), from, to))
                        .expect("valid move");
                assert_eq!(sorted_ids(&next), before, "region {region} {from}->{to}");
            }
        }
    }
}

#[test]
fn cross_region_moves_are_rejected() {
    let places = vec![place("A", "X"), place("C", "Y")];
    let mv = RegionMove {
        source_region: Region::new("X"),
        source_index: 0,
        destination_region: Region::new("Y"),
        destination_index: 0,
    };
    let err = plan_region_move(&places, &mv).expect_err("cross-region");
    assert!(matches!(err, ReorderError::CrossRegion { .. }));
}

#[test]
fn out_of_range_indices_are_rejected() {
    let places = vec![place("A", "X"), place("B", "X"), place("C", "Y")];
    let err = plan_region_move(&places, &RegionMove::within(Region::new("X"), 0, 2))
        .expect_err("destination out of range");
    assert_eq!(
        err,
        ReorderError::IndexOutOfRange {
            region: Region::new("X"),
            index: 2,
            len: 2,
        }
    );

    let err = plan_region_move(&places, &RegionMove::within(Region::new("Q"), 0, 0))
        .expect_err("empty region");
    assert!(matches!(err, ReorderError::IndexOutOfRange { len: 0, .. }));
}

#[test]
fn permuting_a_single_region_and_back_restores_order() {
    let places = vec![place("a", "X"), place("b", "X"), place("c", "X")];
    let region = Region::new("X");

    let moved = plan_region_move(&places, &RegionMove::within(region.clone(), 0, 2))
        .expect("forward");
    assert_eq!(ids(&moved), ["b", "c", "a"]);
    let restored =
        plan_region_move(&moved, &RegionMove::within(region, 2, 0)).expect("backward");
    assert_eq!(restored, places);
}

#[test]
fn groups_follow_first_appearance() {
    let places = vec![
        place("a", "부산광역시"),
        place("b", "서울특별시"),
        place("c", "부산광역시"),
    ];
    let groups = group_by_region(&places);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].region.as_str(), "부산광역시");
    assert_eq!(
        groups[0].places.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        ["a", "c"]
    );
    assert_eq!(groups[1].region.as_str(), "서울특별시");
}

#[test]
fn filter_narrows_by_region_and_category() {
    let mut cafe = place("cafe", "서울특별시");
    cafe.category_type = CategoryType::Dessert;
    let places = vec![cafe, place("other", "서울특별시"), place("far", "제주특별자치도")];

    let filter = PlaceFilter {
        region: Some(Region::new("서울특별시")),
        category: Some(CategoryType::Dessert),
    };
    let matched: Vec<&str> = filter.apply(&places).map(|p| p.id.as_str()).collect();
    assert_eq!(matched, ["cafe"]);

    assert_eq!(PlaceFilter::default().apply(&places).count(), 3);
    assert_eq!(
        distinct_regions(&places),
        [Region::new("서울특별시"), Region::new("제주특별자치도")]
    );
}
