//! Report image tables (`lost_pet_images`, `found_pet_images`)

use crate::client::{ApiRequest, PawfinderClient, Service};
use crate::error::ApiResult;
use pawfinder_search::ReportKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct ImageRow {
    image_url: String,
}

#[derive(Debug, Serialize)]
struct NewImageRow<'a> {
    pet_id: &'a str,
    image_url: &'a str,
}

/// Image table API interface
#[derive(Clone)]
pub struct ImagesApi {
    client: PawfinderClient,
}

impl ImagesApi {
    /// Create a new images API interface
    pub(crate) fn new(client: PawfinderClient) -> Self {
        Self { client }
    }

    fn table_url(&self, kind: ReportKind) -> String {
        self.client.config().rest_url(kind.image_table())
    }

    /// Image URLs attached to a report, in insertion order.
    ///
    /// One lookup runs per listed row, so these bypass the rate limiter; the
    /// listing that produced the rows has already paid for them.
    pub async fn for_report(&self, kind: ReportKind, report_id: &str) -> ApiResult<Vec<String>> {
        let request = ApiRequest::get(Service::Rest, self.table_url(kind))
            .query("select", "image_url")
            .query("pet_id", format!("eq.{report_id}"))
            .query("order", "id.asc")
            .unthrottled();

        let rows: Vec<ImageRow> = self.client.send_json(&request).await?;
        Ok(rows.into_iter().map(|row| row.image_url).collect())
    }

    /// Attach image URLs to a report.
    pub async fn insert(&self, kind: ReportKind, report_id: &str, urls: &[String]) -> ApiResult<()> {
        if urls.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewImageRow<'_>> = urls
            .iter()
            .map(|url| NewImageRow {
                pet_id: report_id,
                image_url: url,
            })
            .collect();

        let request = ApiRequest::post(Service::Rest, self.table_url(kind)).json(&rows)?;
        self.client.send_empty(&request).await
    }

    /// Remove every image row of a report.
    pub async fn delete_for_report(&self, kind: ReportKind, report_id: &str) -> ApiResult<()> {
        let request =
            ApiRequest::delete(Service::Rest, self.table_url(kind)).query("pet_id", format!("eq.{report_id}"));
        self.client.send_empty(&request).await
    }
}
