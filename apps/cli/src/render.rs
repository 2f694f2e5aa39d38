use std::fmt::Write as _;

use client_core::{regions::group_by_region, PlaceFilter};
use shared::domain::{Place, PlaceId};

/// Region blocks in sequence order. Indices are positions within the whole
/// region, which is what `move` expects even when a category filter hides some.
pub fn render_places(places: &[Place], filter: &PlaceFilter, selected: Option<&PlaceId>) -> String {
    let groups = group_by_region(filter.apply(places));
    if groups.is_empty() {
        return "no places\n".to_string();
    }

    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "[{}] ({})", group.region, group.places.len());
        for place in group.places {
            let index = places
                .iter()
                .filter(|p| p.region == place.region)
                .position(|p| p.id == place.id)
                .unwrap_or_default();
            let marker = if selected == Some(&place.id) { '*' } else { ' ' };
            let _ = writeln!(out, "{marker} {index:>2}. {}", render_place(place));
            if !place.comment.trim().is_empty() {
                let _ = writeln!(out, "       \"{}\"", place.comment.trim());
            }
            if let Some(status) = &place.enrichment.status {
                let hours = place.enrichment.business_hours.as_deref().unwrap_or("-");
                let _ = writeln!(out, "       {status} · {hours}");
            }
        }
    }
    out
}

pub fn render_place(place: &Place) -> String {
    format!(
        "{} · {} · {} ({})",
        place.name,
        place.category_type,
        place.lookup_address(),
        place.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{CategoryType, Coordinate, Enrichment, Region};

    fn place(id: &str, region: &str, category: CategoryType) -> Place {
        Place {
            id: PlaceId::new(id),
            name: id.to_uppercase(),
            raw_category: String::new(),
            category_type: category,
            address: format!("{region} 어딘가"),
            normalized_address: String::new(),
            coordinate: Coordinate::FALLBACK,
            comment: String::new(),
            region: Region::new(region),
            link: None,
            enrichment: Enrichment::default(),
        }
    }

    #[test]
    fn indices_stay_region_relative_under_a_category_filter() {
        let places = vec![
            place("a", "서울특별시", CategoryType::Korean),
            place("b", "서울특별시", CategoryType::Dessert),
        ];
        let filter = PlaceFilter {
            region: None,
            category: Some(CategoryType::Dessert),
        };
        let out = render_places(&places, &filter, Some(&PlaceId::new("b")));
        assert!(out.starts_with("[서울특별시] (1)\n"));
        assert!(out.contains("*  1. B · 디저트"));
    }

    #[test]
    fn empty_view_says_so() {
        assert_eq!(render_places(&[], &PlaceFilter::default(), None), "no places\n");
    }
}
