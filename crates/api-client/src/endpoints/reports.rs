//! Report tables (`lost_pets`, `found_pets`)

use crate::client::{ApiRequest, PawfinderClient, Service};
use crate::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use pawfinder_geo::Coordinate;
use pawfinder_search::{Contact, PetCategory, PetReport, ReportKind, ReportRecord};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Filters applied server-side when listing reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQuery {
    /// Only rows with this status
    pub status: Option<String>,
    /// Only rows owned by this user
    pub owner: Option<String>,
    /// Column to order by
    pub order_by: String,
    /// Ascending instead of descending
    pub ascending: bool,
    /// Maximum rows
    pub limit: Option<u32>,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            status: None,
            owner: None,
            order_by: "created_at".to_string(),
            ascending: false,
            limit: None,
        }
    }
}

impl ReportQuery {
    /// Newest first, no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first, active listings only.
    pub fn active() -> Self {
        Self::default().with_status("active")
    }

    /// Restrict to a status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Restrict to one owner.
    #[must_use]
    pub fn with_owner(mut self, user_id: impl Into<String>) -> Self {
        self.owner = Some(user_id.into());
        self
    }

    /// Cap the number of rows.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order by `column`.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order_by = column.into();
        self.ascending = ascending;
        self
    }

    /// PostgREST query parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let direction = if self.ascending { "asc" } else { "desc" };
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), format!("{}.{direction}", self.order_by)),
        ];
        if let Some(ref status) = self.status {
            params.push(("status".to_string(), format!("eq.{status}")));
        }
        if let Some(ref owner) = self.owner {
            params.push(("user_id".to_string(), format!("eq.{owner}")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// A report about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    /// Cat or dog
    pub category: PetCategory,
    /// Breed
    pub breed: String,
    /// Coat pattern
    pub pattern: String,
    /// Colors, most prominent first
    pub colors: Vec<String>,
    /// Day the pet was lost or found
    pub event_date: NaiveDate,
    /// Reward, lost reports only
    pub reward: Option<f64>,
    /// Free-text place
    pub place: String,
    /// Province code
    pub province: String,
    /// Map pin
    pub coordinate: Option<Coordinate>,
    /// Who to call
    pub contact: Contact,
    /// Anything else
    pub description: Option<String>,
    /// Submitting user
    pub owner: Option<String>,
}

impl NewReport {
    /// Row for the `kind` table. Found rows never carry a reward.
    pub fn to_row(&self, kind: ReportKind) -> Value {
        let mut row = Map::new();
        row.insert("pet_type".into(), json!(self.category.as_str()));
        row.insert("breed".into(), json!(self.breed));
        row.insert("pattern".into(), json!(self.pattern));
        row.insert("colors".into(), json!(self.colors.join(", ")));
        row.insert("status".into(), json!("active"));
        row.insert(
            kind.date_column().into(),
            json!(self.event_date.format("%Y-%m-%d").to_string()),
        );
        if kind == ReportKind::Lost {
            if let Some(reward) = self.reward {
                row.insert("reward".into(), json!(reward));
            }
        }
        row.insert("location".into(), json!(self.place));
        row.insert("province".into(), json!(self.province));
        if let Some(coordinate) = self.coordinate {
            row.insert("latitude".into(), json!(coordinate.latitude));
            row.insert("longitude".into(), json!(coordinate.longitude));
        }
        row.insert("contact_name".into(), json!(self.contact.name));
        row.insert("contact_phone".into(), json!(self.contact.phone));
        if !self.contact.email.trim().is_empty() {
            row.insert("contact_email".into(), json!(self.contact.email));
        }
        if let Some(ref description) = self.description {
            row.insert("description".into(), json!(description));
        }
        if let Some(ref owner) = self.owner {
            row.insert("user_id".into(), json!(owner));
        }
        Value::Object(row)
    }
}

/// Convert raw rows, skipping any that do not describe a report.
pub(crate) fn reports_from_rows(kind: ReportKind, rows: Vec<Value>) -> Vec<PetReport> {
    rows.into_iter()
        .filter_map(|row| {
            let record = match serde_json::from_value::<ReportRecord>(row) {
                Ok(record) => record,
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Skipping malformed report row");
                    return None;
                }
            };
            match record.into_report(kind) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Skipping report row");
                    None
                }
            }
        })
        .collect()
}

fn id_of(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Report table API interface
#[derive(Clone)]
pub struct ReportsApi {
    client: PawfinderClient,
}

impl ReportsApi {
    /// Create a new reports API interface
    pub(crate) fn new(client: PawfinderClient) -> Self {
        Self { client }
    }

    fn table_url(&self, kind: ReportKind) -> String {
        self.client.config().rest_url(kind.table())
    }

    /// List reports of one kind. Rows that cannot be read are logged and skipped.
    pub async fn list(&self, kind: ReportKind, query: &ReportQuery) -> ApiResult<Vec<PetReport>> {
        let mut request = ApiRequest::get(Service::Rest, self.table_url(kind));
        for (key, value) in query.to_params() {
            request = request.query(key, value);
        }

        let rows: Vec<Value> = self.client.send_json(&request).await?;
        let total = rows.len();
        let reports = reports_from_rows(kind, rows);
        debug!(kind = %kind, rows = total, reports = reports.len(), "Listed reports");
        Ok(reports)
    }

    /// Fetch one report by id.
    pub async fn get(&self, kind: ReportKind, id: &str) -> ApiResult<PetReport> {
        let request = ApiRequest::get(Service::Rest, self.table_url(kind))
            .query("select", "*")
            .query("id", format!("eq.{id}"))
            .query("limit", "1");

        let rows: Vec<Value> = self.client.send_json(&request).await?;
        reports_from_rows(kind, rows)
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("{} {id}", kind.table())))
    }

    /// Insert a report and return its id.
    pub async fn insert(&self, kind: ReportKind, report: &NewReport) -> ApiResult<String> {
        let request = ApiRequest::post(Service::Rest, self.table_url(kind))
            .header("Prefer", "return=representation")
            .json(&report.to_row(kind))?;

        let rows: Vec<Value> = self.client.send_json(&request).await?;
        rows.first()
            .and_then(id_of)
            .ok_or_else(|| ApiError::api_response(200, "insert returned no id"))
    }

    /// Delete a report by id.
    pub async fn delete(&self, kind: ReportKind, id: &str) -> ApiResult<()> {
        let request = ApiRequest::delete(Service::Rest, self.table_url(kind)).query("id", format!("eq.{id}"));
        self.client.send_empty(&request).await
    }
}
