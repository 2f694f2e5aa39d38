//! Derivation of the stored taxonomy fields from raw place text.
//!
//! Both functions are pure and total: a miss yields the catch-all label.

use shared::domain::{CategoryType, Place, Region};

/// Evaluated top to bottom; the first substring found in the raw category wins.
const CATEGORY_RULES: &[(&str, CategoryType)] = &[
    ("한식", CategoryType::Korean),
    ("중식", CategoryType::Chinese),
    ("양식", CategoryType::Western),
    ("피자", CategoryType::Western),
    ("파스타", CategoryType::Western),
    ("일식", CategoryType::Japanese),
    ("초밥", CategoryType::Japanese),
    ("돈가스", CategoryType::Japanese),
    ("베이커리", CategoryType::Bakery),
    ("빵", CategoryType::Bakery),
    ("카페", CategoryType::Dessert),
    ("디저트", CategoryType::Dessert),
    ("퓨전", CategoryType::Fusion),
];

pub fn classify_category(raw_category: &str) -> CategoryType {
    CATEGORY_RULES
        .iter()
        .find(|(needle, _)| raw_category.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or_default()
}

/// First whitespace-delimited token of the address.
pub fn derive_region(address: &str) -> Region {
    address
        .split_whitespace()
        .next()
        .map(Region::new)
        .unwrap_or_default()
}

/// Recomputes both derived fields in place. Returns whether anything changed.
pub fn reclassify_place(place: &mut Place) -> bool {
    let category_type = classify_category(&place.raw_category);
    let region = derive_region(&place.address);
    let changed = place.category_type != category_type || place.region != region;
    place.category_type = category_type;
    place.region = region;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(classify_category("한식>냉면"), CategoryType::Korean);
        assert_eq!(classify_category("음식점>피자"), CategoryType::Western);
        assert_eq!(classify_category("일식>돈가스"), CategoryType::Japanese);
        // 베이커리 is checked before 카페.
        assert_eq!(classify_category("카페,디저트>베이커리"), CategoryType::Bakery);
        assert_eq!(classify_category("퓨전요리"), CategoryType::Fusion);
    }

    #[test]
    fn overlapping_substrings_follow_rule_priority() {
        // Contains both "중식" and "한식"; the Korean rule is listed first.
        assert_eq!(classify_category("중식,한식 뷔페"), CategoryType::Korean);
    }

    #[test]
    fn misses_fall_back_to_other() {
        assert_eq!(classify_category(""), CategoryType::Other);
        assert_eq!(classify_category("술집>포장마차"), CategoryType::Other);
    }

    #[test]
    fn classification_is_deterministic() {
        let raw = "양식>파스타,스파게티";
        let first = classify_category(raw);
        for _ in 0..16 {
            assert_eq!(classify_category(raw), first);
        }
    }

    #[test]
    fn region_is_first_address_token() {
        assert_eq!(derive_region("서울시 강남구 역삼동 123").as_str(), "서울시");
        assert_eq!(derive_region("  경기도  성남시").as_str(), "경기도");
    }

    #[test]
    fn empty_address_yields_catch_all_region() {
        assert_eq!(derive_region(""), Region::other());
        assert_eq!(derive_region("   "), Region::other());
    }
}
