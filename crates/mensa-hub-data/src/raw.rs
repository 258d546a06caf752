
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// One slot of a weekday hours array. The remote documents store a flat list
/// of 4-tuples `(opens, closes, last_order, is_open)`, so a slot is either a
/// `"H.MM"` clock string or the open/closed flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoursEntry {
    Flag(bool),
    Time(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDocument {
    pub id: String,
    pub name: String,
    pub location: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub opening_hours_string: Option<String>,
    #[serde(default)]
    pub hours_mon: Option<Vec<HoursEntry>>,
    #[serde(default)]
    pub hours_tue: Option<Vec<HoursEntry>>,
    #[serde(default)]
    pub hours_wed: Option<Vec<HoursEntry>>,
    #[serde(default)]
    pub hours_thu: Option<Vec<HoursEntry>>,
    #[serde(default)]
    pub hours_fri: Option<Vec<HoursEntry>>,
    #[serde(default)]
    pub hours_sat: Option<Vec<HoursEntry>>,
    #[serde(default)]
    pub hours_sun: Option<Vec<HoursEntry>>,
}

impl ProviderDocument {
    /// a missing field means the provider has no entry for that weekday
    pub fn hours_for(&self, day: Weekday) -> Option<&[HoursEntry]> {
        let field = match day {
            Weekday::Mon => &self.hours_mon,
            Weekday::Tue => &self.hours_tue,
            Weekday::Wed => &self.hours_wed,
            Weekday::Thu => &self.hours_thu,
            Weekday::Fri => &self.hours_fri,
            Weekday::Sat => &self.hours_sat,
            Weekday::Sun => &self.hours_sun,
        };
        field.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealDocument {
    pub provider_id: String,
    pub name: String,
    /// unix timestamp
    pub served_at: i64,
    #[serde(default)]
    pub allergens: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    // required for a well-formed meal, but validated at meal build time so
    // their absence is a descriptive parse failure instead of a serde error
    #[serde(default)]
    pub price_student: Option<String>,
    #[serde(default)]
    pub price_employee: Option<String>,
    #[serde(default)]
    pub price_guest: Option<String>,
}
