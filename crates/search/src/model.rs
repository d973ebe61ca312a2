//! Report data model.
//!
//! [`PetReport`] is the in-memory shape every ranking function works on.
//! [`ReportRecord`] is the flat row the backend stores in `lost_pets` and
//! `found_pets`; [`ReportRecord::into_report`] is the only place wire quirks
//! (comma-delimited colors, split latitude/longitude columns, per-table date
//! column names) are handled.

use crate::error::{Result, SearchError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use pawfinder_geo::Coordinate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a report is about a missing pet or a pet someone picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Owner is looking for their pet
    Lost,
    /// Finder is looking for the owner
    Found,
}

impl ReportKind {
    /// Both kinds, lost first.
    pub const ALL: [ReportKind; 2] = [ReportKind::Lost, ReportKind::Found];

    /// Table holding reports of this kind.
    pub fn table(self) -> &'static str {
        match self {
            ReportKind::Lost => "lost_pets",
            ReportKind::Found => "found_pets",
        }
    }

    /// Table holding image rows for reports of this kind.
    pub fn image_table(self) -> &'static str {
        match self {
            ReportKind::Lost => "lost_pet_images",
            ReportKind::Found => "found_pet_images",
        }
    }

    /// Column holding the date the pet went missing or was found.
    pub fn date_column(self) -> &'static str {
        match self {
            ReportKind::Lost => "date_lost",
            ReportKind::Found => "date_found",
        }
    }

    /// Lowercase name used in storage paths and CLI arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Lost => "lost",
            ReportKind::Found => "found",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lost" => Ok(ReportKind::Lost),
            "found" => Ok(ReportKind::Found),
            other => Err(SearchError::InvalidValue {
                field: "kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Animal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetCategory {
    /// Cat
    Cat,
    /// Dog
    Dog,
}

impl PetCategory {
    /// Lowercase name as stored in the `pet_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            PetCategory::Cat => "cat",
            PetCategory::Dog => "dog",
        }
    }
}

impl fmt::Display for PetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetCategory {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cat" => Ok(PetCategory::Cat),
            "dog" => Ok(PetCategory::Dog),
            other => Err(SearchError::InvalidValue {
                field: "pet_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Listing status. Only `active` carries meaning; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportStatus {
    /// Still looking
    #[default]
    Active,
    /// Any other status (`resolved`, `closed`, ...)
    Other(String),
}

impl ReportStatus {
    /// Parse a status column value; blank means active.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("active") {
            ReportStatus::Active
        } else {
            ReportStatus::Other(trimmed.to_string())
        }
    }

    /// Whether the report is still open.
    pub fn is_active(&self) -> bool {
        matches!(self, ReportStatus::Active)
    }

    /// Status as stored.
    pub fn as_str(&self) -> &str {
        match self {
            ReportStatus::Active => "active",
            ReportStatus::Other(s) => s,
        }
    }
}

impl Serialize for ReportStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ReportStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ReportStatus::parse(&raw))
    }
}

/// Monetary reward offered by an owner, in baht. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Reward(f64);

impl Reward {
    /// Build a reward, rejecting negative or non-finite amounts.
    pub fn new(amount: f64) -> Option<Self> {
        (amount.is_finite() && amount >= 0.0).then_some(Self(amount))
    }

    /// Amount in baht.
    pub fn amount(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Reward {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Reward::new(amount)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid reward amount {amount}")))
    }
}

/// Where the pet was lost or found.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Free-text place description
    pub place: String,
    /// Province code
    pub province: String,
    /// Map pin, if one was dropped
    pub coordinate: Option<Coordinate>,
}

/// How to reach the reporter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// Email address, possibly empty
    pub email: String,
}

/// A lost or found pet report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ReportShape")]
pub struct PetReport {
    /// Row id
    pub id: String,
    /// Lost or found
    pub kind: ReportKind,
    /// Cat or dog
    pub category: PetCategory,
    /// Breed, free text
    pub breed: String,
    /// Coat pattern, free text
    pub pattern: String,
    /// Coat colors in the order the reporter gave them
    pub colors: Vec<String>,
    /// Listing status
    pub status: ReportStatus,
    /// Date lost or found, raw as stored
    pub event_date: Option<String>,
    /// Listing timestamp, raw as stored
    pub created_at: Option<String>,
    /// Reward; only ever set on lost reports
    pub reward: Option<Reward>,
    /// Place, province and pin
    pub location: Location,
    /// Reporter contact details
    pub contact: Contact,
    /// Image URLs in upload order
    pub images: Vec<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Owning user id
    pub owner: Option<String>,
}

/// Deserialization twin of [`PetReport`]; converting drops rewards on found reports.
#[derive(Deserialize)]
struct ReportShape {
    id: String,
    kind: ReportKind,
    category: PetCategory,
    #[serde(default)]
    breed: String,
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    status: ReportStatus,
    #[serde(default)]
    event_date: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    reward: Option<Reward>,
    #[serde(default)]
    location: Location,
    #[serde(default)]
    contact: Contact,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    owner: Option<String>,
}

impl From<ReportShape> for PetReport {
    fn from(shape: ReportShape) -> Self {
        PetReport {
            id: shape.id,
            kind: shape.kind,
            category: shape.category,
            breed: shape.breed,
            pattern: shape.pattern,
            colors: shape.colors,
            status: shape.status,
            event_date: shape.event_date,
            created_at: shape.created_at,
            reward: shape.reward,
            location: shape.location,
            contact: shape.contact,
            images: shape.images,
            description: shape.description,
            owner: shape.owner,
        }
        .normalized()
    }
}

impl PetReport {
    /// A minimal report, mostly useful for building fixtures.
    pub fn new(id: impl Into<String>, kind: ReportKind, category: PetCategory) -> Self {
        Self {
            id: id.into(),
            kind,
            category,
            breed: String::new(),
            pattern: String::new(),
            colors: Vec::new(),
            status: ReportStatus::Active,
            event_date: None,
            created_at: None,
            reward: None,
            location: Location::default(),
            contact: Contact::default(),
            images: Vec::new(),
            description: None,
            owner: None,
        }
    }

    /// Set the reward. Ignored on found reports.
    #[must_use]
    pub fn with_reward(mut self, amount: f64) -> Self {
        self.reward = Reward::new(amount);
        self.normalized()
    }

    /// Set the event date.
    #[must_use]
    pub fn with_event_date(mut self, date: impl Into<String>) -> Self {
        self.event_date = Some(date.into());
        self
    }

    /// Set the province code.
    #[must_use]
    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.location.province = province.into();
        self
    }

    /// Set the map pin.
    #[must_use]
    pub fn with_coordinate(mut self, coordinate: Coordinate) -> Self {
        self.location.coordinate = Some(coordinate);
        self
    }

    /// Enforce the reward-only-on-lost rule.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.kind == ReportKind::Found {
            self.reward = None;
        }
        self
    }

    /// Reward amount with a missing reward counted as zero.
    pub fn reward_amount(&self) -> f64 {
        self.reward.map_or(0.0, Reward::amount)
    }

    /// Calendar date of `event_date`, if it parses.
    pub fn event_day(&self) -> Option<NaiveDate> {
        self.event_date.as_deref().and_then(parse_day)
    }

    /// Colors joined the way the backend stores them.
    pub fn colors_joined(&self) -> String {
        self.colors.join(", ")
    }
}

/// Calendar date at the start of a raw date or timestamp string.
///
/// Uses the date as written, so `2024-03-01T23:30:00+07:00` is March 1st.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Parse the timestamp formats the backend produces.
///
/// Accepts RFC 3339, Postgres `timestamptz` text (`2024-03-01 10:00:00+00`),
/// naive date-times (taken as UTC) and plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Row as stored in `lost_pets` / `found_pets`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Row id; numeric ids are accepted and stringified
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    /// `cat` or `dog`
    pub pet_type: String,
    /// Breed
    #[serde(default)]
    pub breed: Option<String>,
    /// Coat pattern
    #[serde(default)]
    pub pattern: Option<String>,
    /// Comma-delimited colors
    #[serde(default)]
    pub colors: Option<String>,
    /// Listing status
    #[serde(default)]
    pub status: Option<String>,
    /// `date_lost` or `date_found` depending on the table
    #[serde(default, alias = "date_lost", alias = "date_found")]
    pub event_date: Option<String>,
    /// Listing timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Reward amount (lost table only)
    #[serde(default)]
    pub reward: Option<f64>,
    /// Free-text place
    #[serde(default)]
    pub location: Option<String>,
    /// Province code
    #[serde(default)]
    pub province: Option<String>,
    /// Pin latitude
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Pin longitude
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Contact name
    #[serde(default)]
    pub contact_name: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub contact_phone: Option<String>,
    /// Contact email
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Owning user
    #[serde(default)]
    pub user_id: Option<String>,
}

fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id {other}"))),
    }
}

/// Split a comma-delimited color list, dropping blanks.
pub fn split_colors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

impl ReportRecord {
    /// Convert a stored row into a report of the given kind.
    ///
    /// Fails only when `pet_type` is not a known category. A pin is kept only
    /// when both latitude and longitude are present; a negative or non-finite
    /// reward is dropped.
    pub fn into_report(self, kind: ReportKind) -> Result<PetReport> {
        let category = self.pet_type.parse::<PetCategory>().map_err(|_| SearchError::InvalidRecord {
            id: self.id.clone(),
            reason: format!("unknown pet_type '{}'", self.pet_type),
        })?;

        let coordinate = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        };

        let report = PetReport {
            id: self.id,
            kind,
            category,
            breed: self.breed.unwrap_or_default(),
            pattern: self.pattern.unwrap_or_default(),
            colors: self.colors.as_deref().map(split_colors).unwrap_or_default(),
            status: self.status.as_deref().map(ReportStatus::parse).unwrap_or_default(),
            event_date: self.event_date,
            created_at: self.created_at,
            reward: self.reward.and_then(Reward::new),
            location: Location {
                place: self.location.unwrap_or_default(),
                province: self.province.unwrap_or_default(),
                coordinate,
            },
            contact: Contact {
                name: self.contact_name.unwrap_or_default(),
                phone: self.contact_phone.unwrap_or_default(),
                email: self.contact_email.unwrap_or_default(),
            },
            images: Vec::new(),
            description: self.description,
            owner: self.user_id,
        };

        Ok(report.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_found_reports_drop_reward() {
        let report = PetReport::new("1", ReportKind::Found, PetCategory::Dog).with_reward(500.0);
        assert_eq!(report.reward, None);

        let lost = PetReport::new("2", ReportKind::Lost, PetCategory::Dog).with_reward(500.0);
        assert_eq!(lost.reward_amount(), 500.0);
    }

    #[test]
    fn test_deserialize_found_report_drops_reward() {
        let json = r#"{"id": "f1", "kind": "found", "category": "cat", "reward": 1000}"#;
        let report: PetReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.reward, None);
        assert!(report.status.is_active());
    }

    #[test]
    fn test_negative_reward_rejected() {
        assert!(Reward::new(-1.0).is_none());
        assert!(Reward::new(f64::NAN).is_none());
        assert!(serde_json::from_str::<Reward>("-5").is_err());
    }

    #[test]
    fn test_record_into_report() {
        let json = r#"{
            "id": 42,
            "pet_type": "Cat",
            "colors": "orange, white,,",
            "status": "active",
            "date_lost": "2024-03-01",
            "reward": 2000,
            "location": "Lumphini Park",
            "province": "BKK",
            "latitude": 13.7314,
            "longitude": 100.5414,
            "contact_name": "Somchai",
            "contact_phone": "0812345678"
        }"#;
        let record: ReportRecord = serde_json::from_str(json).unwrap();
        let report = record.into_report(ReportKind::Lost).unwrap();

        assert_eq!(report.id, "42");
        assert_eq!(report.category, PetCategory::Cat);
        assert_eq!(report.colors, vec!["orange", "white"]);
        assert_eq!(report.event_date.as_deref(), Some("2024-03-01"));
        assert_eq!(report.reward_amount(), 2000.0);
        assert_eq!(report.location.province, "BKK");
        assert!(report.location.coordinate.is_some());
        assert_eq!(report.contact.email, "");
    }

    #[test]
    fn test_record_half_pin_is_no_pin() {
        let record = ReportRecord {
            id: "7".into(),
            pet_type: "dog".into(),
            latitude: Some(13.0),
            ..Default::default()
        };
        let report = record.into_report(ReportKind::Found).unwrap();
        assert!(report.location.coordinate.is_none());
    }

    #[test]
    fn test_record_unknown_category() {
        let record = ReportRecord {
            id: "9".into(),
            pet_type: "rabbit".into(),
            ..Default::default()
        };
        assert!(matches!(
            record.into_report(ReportKind::Lost),
            Err(SearchError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_status_parse() {
        assert!(ReportStatus::parse("ACTIVE").is_active());
        assert!(ReportStatus::parse("").is_active());
        assert_eq!(ReportStatus::parse("resolved"), ReportStatus::Other("resolved".into()));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-01T10:15:00Z").unwrap();
        assert_eq!(rfc.hour(), 10);

        let pg = parse_timestamp("2024-03-01 10:15:00.123+07").unwrap();
        assert_eq!(pg.hour(), 3);

        let naive = parse_timestamp("2024-03-01T10:15:00").unwrap();
        assert_eq!(naive.minute(), 15);

        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date.day(), 1);
        assert_eq!(date.hour(), 0);

        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_parse_day_uses_written_date() {
        assert_eq!(
            parse_day("2024-03-01T23:30:00+07:00"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_day("03/01/2024"), None);
        assert_eq!(parse_day("2024"), None);
    }

    #[test]
    fn test_kind_tables() {
        assert_eq!(ReportKind::Lost.table(), "lost_pets");
        assert_eq!(ReportKind::Found.image_table(), "found_pet_images");
        assert_eq!(ReportKind::Found.date_column(), "date_found");
        assert_eq!("LOST".parse::<ReportKind>().unwrap(), ReportKind::Lost);
    }
}
