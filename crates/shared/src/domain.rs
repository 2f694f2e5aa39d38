use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catch-all label used for both category and region when nothing better is known.
pub const OTHER_LABEL: &str = "기타";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub String);

impl PlaceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh random id for a newly created place.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Seoul City Hall; used whenever geocoding cannot resolve an address.
    pub const FALLBACK: Coordinate = Coordinate {
        lat: 37.5665,
        lng: 126.9780,
    };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::FALLBACK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryType {
    Korean,
    Chinese,
    Western,
    Japanese,
    Bakery,
    Dessert,
    Fusion,
    #[default]
    Other,
}

impl CategoryType {
    pub const ALL: [CategoryType; 8] = [
        CategoryType::Korean,
        CategoryType::Chinese,
        CategoryType::Western,
        CategoryType::Japanese,
        CategoryType::Bakery,
        CategoryType::Dessert,
        CategoryType::Fusion,
        CategoryType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CategoryType::Korean => "한식",
            CategoryType::Chinese => "중식",
            CategoryType::Western => "양식",
            CategoryType::Japanese => "일식",
            CategoryType::Bakery => "빵집",
            CategoryType::Dessert => "디저트",
            CategoryType::Fusion => "퓨전",
            CategoryType::Other => OTHER_LABEL,
        }
    }

    /// Exact label match only.
    pub fn parse_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == label.trim())
    }

    /// Unknown labels collapse into [`CategoryType::Other`].
    pub fn from_label(label: &str) -> Self {
        Self::parse_label(label).unwrap_or_default()
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for CategoryType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<CategoryType> for String {
    fn from(value: CategoryType) -> Self {
        value.label().to_string()
    }
}

/// Partition key used to group places for display and to scope reordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Region(String);

impl Region {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        if label.trim().is_empty() {
            Self::other()
        } else {
            Self(label)
        }
    }

    pub fn other() -> Self {
        Self(OTHER_LABEL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::other()
    }
}

impl From<String> for Region {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Region {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Details gathered by an enrichment refresh. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_vibes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.business_hours.is_none()
            && self.phone_number.is_none()
            && self.recent_vibes.is_none()
            && self.price_range.is_none()
            && self.last_updated.is_none()
    }
}

/// A saved place. `category_type` and `region` are stored, not derived on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    #[serde(rename = "category", default)]
    pub raw_category: String,
    #[serde(default)]
    pub category_type: CategoryType,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "roadAddress", default)]
    pub normalized_address: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

impl Place {
    /// Address used for lookups: the normalized (road) address when present.
    pub fn lookup_address(&self) -> &str {
        if self.normalized_address.trim().is_empty() {
            &self.address
        } else {
            &self.normalized_address
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_type_round_trips_through_korean_label() {
        let json = serde_json::to_string(&CategoryType::Japanese).expect("serialize");
        assert_eq!(json, "\"일식\"");
        let parsed: CategoryType = serde_json::from_str("\"디저트\"").expect("deserialize");
        assert_eq!(parsed, CategoryType::Dessert);
    }

    #[test]
    fn unknown_category_label_maps_to_other() {
        let parsed: CategoryType = serde_json::from_str("\"분식\"").expect("deserialize");
        assert_eq!(parsed, CategoryType::Other);
        assert_eq!(CategoryType::parse_label("분식"), None);
        assert_eq!(CategoryType::parse_label(" 기타 "), Some(CategoryType::Other));
    }

    #[test]
    fn place_uses_camel_case_wire_names() {
        let place = Place {
            id: PlaceId::new("abc123"),
            name: "을지면옥".into(),
            raw_category: "한식>냉면".into(),
            category_type: CategoryType::Korean,
            address: "서울특별시 중구 입정동 177".into(),
            normalized_address: "서울특별시 중구 충무로14길 2-1".into(),
            coordinate: Coordinate::new(37.566, 126.991),
            comment: "평양냉면".into(),
            region: Region::new("서울특별시"),
            link: None,
            enrichment: Enrichment {
                phone_number: Some("02-2266-7052".into()),
                ..Enrichment::default()
            },
        };

        let value = serde_json::to_value(&place).expect("serialize");
        assert_eq!(value["category"], "한식>냉면");
        assert_eq!(value["categoryType"], "한식");
        assert_eq!(value["roadAddress"], "서울특별시 중구 충무로14길 2-1");
        assert_eq!(value["lat"], 37.566);
        assert_eq!(value["phoneNumber"], "02-2266-7052");
        assert!(value.get("status").is_none());
        assert!(value.get("link").is_none());

        let back: Place = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, place);
    }

    #[test]
    fn sparse_record_fills_defaults() {
        let place: Place = serde_json::from_str(
            r#"{"id":"x1","name":"somewhere","lat":1.0,"lng":2.0}"#,
        )
        .expect("deserialize");
        assert_eq!(place.region, Region::other());
        assert_eq!(place.category_type, CategoryType::Other);
        assert!(place.comment.is_empty());
        assert!(place.enrichment.is_empty());
    }

    #[test]
    fn blank_region_on_the_wire_becomes_other() {
        let place: Place = serde_json::from_str(
            r#"{"id":"x2","name":"n","lat":1.0,"lng":2.0,"region":""}"#,
        )
        .expect("deserialize");
        assert_eq!(place.region, Region::other());
    }

    #[test]
    fn blank_region_label_becomes_other() {
        assert_eq!(Region::new("  "), Region::other());
        assert_eq!(Region::new("부산광역시").as_str(), "부산광역시");
    }

    #[test]
    fn generated_ids_are_distinct_and_non_blank() {
        let a = PlaceId::generate();
        let b = PlaceId::generate();
        assert_ne!(a, b);
        assert!(!a.is_blank());
    }
}
