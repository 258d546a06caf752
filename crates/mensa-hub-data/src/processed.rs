use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::images::ImageTable;
use crate::raw::ProviderDocument;
use crate::schedule;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid time string `{0}`, expected H.MM")]
    InvalidTime(String),
    #[error("{day} hours have {len} entries, not a multiple of 4")]
    MisalignedHours { day: Weekday, len: usize },
    #[error("{day} hours: tuple position {pos} has the wrong type")]
    HoursType { day: Weekday, pos: usize },
    #[error("invalid unix timestamp {0}")]
    InvalidTimestamp(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditiveKind {
    Allergen,
    Ingredient,
}

impl AdditiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdditiveKind::Allergen => "allergen",
            AdditiveKind::Ingredient => "ingredient",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allergen" => Some(AdditiveKind::Allergen),
            "ingredient" => Some(AdditiveKind::Ingredient),
            _ => None,
        }
    }
}

/// A meal component the user can mark as disliked. `name` is the sole
/// identity key; at most one record per name is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Additive {
    pub name: String,
    pub kind: AdditiveKind,
    pub liked: bool,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Employee,
    Guest,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub name: String,
    pub additives: Vec<Additive>,
    pub prices: BTreeMap<Role, String>,
}

/// All meals served on one calendar date, in arrival order.
#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
}

/// A decoded opening interval. Closed placeholders are kept so segment
/// indices stay aligned with any parallel per-segment data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSegment {
    Open {
        opens_at: NaiveTime,
        closes_at: NaiveTime,
        last_order_at: NaiveTime,
    },
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySchedule {
    pub day: Weekday,
    pub segments: Vec<TimeSegment>,
}

/// Per-weekday opening segments, ordered Mon..Sun. Days without a schedule
/// field in the source document are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeekSchedule {
    days: Vec<DaySchedule>,
}

impl WeekSchedule {
    pub fn new(days: Vec<DaySchedule>) -> Self {
        Self { days }
    }

    pub fn day(&self, day: Weekday) -> Option<&[TimeSegment]> {
        self.days
            .iter()
            .find(|d| d.day == day)
            .map(|d| d.segments.as_slice())
    }

    pub fn days(&self) -> std::slice::Iter<'_, DaySchedule> {
        self.days.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodProvider {
    pub id: String,
    pub name: String,
    pub location: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub image: String,
    pub description: String,
    pub opening_hours: WeekSchedule,
    pub opening_hours_text: String,
}

impl FoodProvider {
    pub fn from_document(
        document: ProviderDocument,
        images: &ImageTable,
    ) -> Result<Self, ParseError> {
        let opening_hours = schedule::extract_week(&document)?;
        let image = images
            .provider_image(&document.kind, &document.name, &document.location)
            .to_string();

        Ok(Self {
            id: document.id,
            image,
            address: document.address.unwrap_or_default(),
            description: document.description.unwrap_or_default(),
            opening_hours,
            opening_hours_text: document.opening_hours_string.unwrap_or_default(),
            name: document.name,
            location: document.location,
            category: document.category,
            kind: document.kind,
        })
    }
}

// equality tracks what the listing screens display; id, the free-text
// description and the decoded schedule do not participate
impl PartialEq for FoodProvider {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.location == other.location
            && self.category == other.category
            && self.kind == other.kind
            && self.address == other.address
            && self.image == other.image
            && self.opening_hours_text == other.opening_hours_text
    }
}

impl Eq for FoodProvider {}

impl Hash for FoodProvider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.location.hash(state);
        self.category.hash(state);
        self.kind.hash(state);
        self.address.hash(state);
        self.image.hash(state);
        self.opening_hours_text.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;

    fn document(id: &str, description: &str) -> ProviderDocument {
        ProviderDocument {
            id: id.into(),
            name: "Mensa am Studentenhaus".into(),
            location: "Würzburg".into(),
            category: "canteen".into(),
            kind: "Mensa".into(),
            address: Some("Am Studentenhaus 1".into()),
            description: Some(description.into()),
            opening_hours_string: Some("Mo-Fr 8-14".into()),
            hours_mon: None,
            hours_tue: None,
            hours_wed: None,
            hours_thu: None,
            hours_fri: None,
            hours_sat: None,
            hours_sun: None,
        }
    }

    #[test]
    fn equality_ignores_id_and_description() {
        let images = ImageTable::new(HashMap::new(), "default.png");
        let a = FoodProvider::from_document(document("a", "old text"), &images).unwrap();
        let b = FoodProvider::from_document(document("b", "new text"), &images).unwrap();

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn equality_covers_display_fields() {
        let images = ImageTable::new(HashMap::new(), "default.png");
        let a = FoodProvider::from_document(document("a", ""), &images).unwrap();
        let mut b = FoodProvider::from_document(document("a", ""), &images).unwrap();
        b.address = "Hubland Nord".into();

        assert_ne!(a, b);
    }

    #[test]
    fn missing_optionals_become_empty_strings() {
        let images = ImageTable::new(HashMap::new(), "default.png");
        let mut doc = document("a", "");
        doc.address = None;
        doc.opening_hours_string = None;

        let provider = FoodProvider::from_document(doc, &images).unwrap();
        assert_eq!(provider.address, "");
        assert_eq!(provider.opening_hours_text, "");
        assert!(provider.opening_hours.is_empty());
    }
}
