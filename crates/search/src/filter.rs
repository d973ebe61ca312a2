//! Filter composition.
//!
//! Each criterion is either a wildcard or an exact value; a report passes when
//! every criterion matches. Legacy sentinel strings (`"all"`, `""`) are only
//! understood by [`FilterCriteria::from_params`].

use crate::error::{Result, SearchError};
use crate::model::{PetCategory, PetReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single filter criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "match", content = "value")]
pub enum Criterion<T> {
    /// Matches everything
    Any,
    /// Matches only this value
    Exactly(T),
}

impl<T> Default for Criterion<T> {
    fn default() -> Self {
        Criterion::Any
    }
}

impl<T> Criterion<T> {
    /// Whether this criterion is a wildcard.
    pub fn is_any(&self) -> bool {
        matches!(self, Criterion::Any)
    }

    /// Test a candidate. `None` (value unknown) only passes a wildcard.
    pub fn matches(&self, candidate: Option<&T>) -> bool
    where
        T: PartialEq,
    {
        match self {
            Criterion::Any => true,
            Criterion::Exactly(expected) => candidate == Some(expected),
        }
    }

    /// Parse a raw parameter, treating blank and `all` as a wildcard.
    pub fn from_param<F>(raw: &str, parse: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(Criterion::Any)
        } else {
            parse(trimmed).map(Criterion::Exactly)
        }
    }
}

/// Province, category and date criteria, AND-combined.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Province code, compared case-sensitively
    #[serde(default)]
    pub province: Criterion<String>,
    /// Cat or dog
    #[serde(default)]
    pub category: Criterion<PetCategory>,
    /// Calendar date of the lost/found event
    #[serde(default)]
    pub date: Criterion<NaiveDate>,
}

impl FilterCriteria {
    /// Criteria that match every report.
    pub fn any() -> Self {
        Self::default()
    }

    /// Build criteria from query-string style parameters.
    ///
    /// ```
    /// use pawfinder_search::{Criterion, FilterCriteria, PetCategory};
    ///
    /// let criteria = FilterCriteria::from_params("all", "cat", "").unwrap();
    /// assert_eq!(criteria.province, Criterion::Any);
    /// assert_eq!(criteria.category, Criterion::Exactly(PetCategory::Cat));
    /// assert!(FilterCriteria::from_params("all", "hamster", "").is_err());
    /// ```
    pub fn from_params(province: &str, pet_type: &str, date: &str) -> Result<Self> {
        Ok(Self {
            province: Criterion::from_param(province, |p| Ok(p.to_string()))?,
            category: Criterion::from_param(pet_type, str::parse)?,
            date: Criterion::from_param(date, |d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| SearchError::InvalidValue {
                    field: "date",
                    value: d.to_string(),
                })
            })?,
        })
    }

    /// Restrict to one province.
    #[must_use]
    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Criterion::Exactly(province.into());
        self
    }

    /// Restrict to one category.
    #[must_use]
    pub fn with_category(mut self, category: PetCategory) -> Self {
        self.category = Criterion::Exactly(category);
        self
    }

    /// Restrict to one event date.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Criterion::Exactly(date);
        self
    }

    /// Whether every criterion is a wildcard.
    pub fn is_any(&self) -> bool {
        self.province.is_any() && self.category.is_any() && self.date.is_any()
    }

    /// Whether a single report passes every criterion.
    pub fn matches(&self, report: &PetReport) -> bool {
        self.province.matches(Some(&report.location.province))
            && self.category.matches(Some(&report.category))
            && self.date.matches(report.event_day().as_ref())
    }
}

/// Keep reports matching all criteria, in their original order.
pub fn filter_reports(reports: &[PetReport], criteria: &FilterCriteria) -> Vec<PetReport> {
    if criteria.is_any() {
        return reports.to_vec();
    }
    reports
        .iter()
        .filter(|report| criteria.matches(report))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportKind;
    use proptest::prelude::*;

    fn fixture() -> Vec<PetReport> {
        vec![
            PetReport::new("c1", ReportKind::Lost, PetCategory::Cat)
                .with_province("BKK")
                .with_event_date("2024-03-01"),
            PetReport::new("d1", ReportKind::Lost, PetCategory::Dog)
                .with_province("CNX")
                .with_event_date("2024-03-01"),
            PetReport::new("c2", ReportKind::Found, PetCategory::Cat)
                .with_province("CNX")
                .with_event_date("2024-03-02T08:00:00Z"),
            PetReport::new("d2", ReportKind::Found, PetCategory::Dog).with_province("BKK"),
            PetReport::new("c3", ReportKind::Lost, PetCategory::Cat)
                .with_province("PKT")
                .with_event_date("not a date"),
        ]
    }

    fn ids(reports: &[PetReport]) -> Vec<&str> {
        reports.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_cats_only_keeps_order() {
        let criteria = FilterCriteria::from_params("all", "cat", "").unwrap();
        let result = filter_reports(&fixture(), &criteria);
        assert_eq!(ids(&result), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_criteria_are_and_combined() {
        let criteria = FilterCriteria::any()
            .with_province("CNX")
            .with_category(PetCategory::Cat);
        let result = filter_reports(&fixture(), &criteria);
        assert_eq!(ids(&result), vec!["c2"]);
    }

    #[test]
    fn test_province_is_case_sensitive() {
        let criteria = FilterCriteria::any().with_province("bkk");
        assert!(filter_reports(&fixture(), &criteria).is_empty());
    }

    #[test]
    fn test_date_matches_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let result = filter_reports(&fixture(), &FilterCriteria::any().with_date(day));
        assert_eq!(ids(&result), vec!["c2"]);
    }

    #[test]
    fn test_unparseable_date_never_matches_exact() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let result = filter_reports(&fixture(), &FilterCriteria::any().with_date(day));
        assert_eq!(ids(&result), vec!["c1", "d1"]);
    }

    #[test]
    fn test_empty_input() {
        let criteria = FilterCriteria::any().with_category(PetCategory::Dog);
        assert!(filter_reports(&[], &criteria).is_empty());
    }

    #[test]
    fn test_from_params_sentinels() {
        let criteria = FilterCriteria::from_params(" ALL ", "", "  ").unwrap();
        assert!(criteria.is_any());
    }

    #[test]
    fn test_from_params_rejects_bad_values() {
        assert_eq!(
            FilterCriteria::from_params("BKK", "cat", "01/03/2024"),
            Err(SearchError::InvalidValue {
                field: "date",
                value: "01/03/2024".into()
            })
        );
        assert!(FilterCriteria::from_params("BKK", "bird", "").is_err());
    }

    #[test]
    fn test_criteria_serde() {
        let criteria = FilterCriteria::any().with_category(PetCategory::Dog);
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(json["category"]["match"], "exactly");
        assert_eq!(json["category"]["value"], "dog");
        assert_eq!(json["province"]["match"], "any");
    }

    proptest! {
        #[test]
        fn prop_all_wildcard_is_identity(cats in proptest::collection::vec(any::<bool>(), 0..40)) {
            let reports: Vec<PetReport> = cats
                .iter()
                .enumerate()
                .map(|(i, is_cat)| {
                    let category = if *is_cat { PetCategory::Cat } else { PetCategory::Dog };
                    PetReport::new(i.to_string(), ReportKind::Lost, category)
                })
                .collect();
            prop_assert_eq!(filter_reports(&reports, &FilterCriteria::any()), reports);
        }
    }
}
