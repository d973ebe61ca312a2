//! Report submission.
//!
//! A report and its photos are written in three dependent calls: insert the
//! row, upload each photo, insert the image rows. None of this is atomic, so
//! when a later step fails the [`OrphanPolicy`] decides what happens to the
//! pieces already written.

use crate::client::PawfinderClient;
use crate::endpoints::NewReport;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::NaiveDate;
use pawfinder_core::config::{OrphanPolicy, SubmitConfig};
use pawfinder_core::validation::Validator;
use pawfinder_core::{Error as CoreError, ErrorCode};
use pawfinder_geo::Coordinate;
use pawfinder_search::{Contact, PetCategory, ReportKind};
use pawfinder_telemetry::Event;
use serde_json::json;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A photo picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl PhotoUpload {
    /// Photo with the given name, type and contents.
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Whether the content type is an image type.
    pub fn is_image(&self) -> bool {
        self.content_type.trim().to_ascii_lowercase().starts_with("image/")
    }

    /// File extension for the stored object.
    pub fn extension(&self) -> String {
        let by_type = match self.content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            "image/heic" => Some("heic"),
            _ => None,
        };
        if let Some(ext) = by_type {
            return ext.to_string();
        }
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase)
    }
}

/// Report as typed into the form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportForm {
    /// Lost or found
    pub kind: ReportKind,
    /// Cat or dog
    pub category: Option<PetCategory>,
    /// Breed
    pub breed: String,
    /// Coat pattern
    pub pattern: String,
    /// Colors, most prominent first
    pub colors: Vec<String>,
    /// Day the pet was lost or found
    pub event_date: Option<NaiveDate>,
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
    /// Photos to upload
    pub photos: Vec<PhotoUpload>,
}

impl ReportForm {
    /// Empty form for `kind`.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            category: None,
            breed: String::new(),
            pattern: String::new(),
            colors: Vec::new(),
            event_date: None,
            reward: None,
            place: String::new(),
            province: String::new(),
            coordinate: None,
            contact: Contact::default(),
            description: None,
            photos: Vec::new(),
        }
    }

    fn colors(&self) -> Vec<String> {
        self.colors
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check every field. Errors carry one entry per failing field.
    pub fn validate(&self, config: &SubmitConfig, today: NaiveDate) -> pawfinder_core::Result<()> {
        let mut v = Validator::new()
            .required("contact_name", &self.contact.name)
            .required("contact_phone", &self.contact.phone)
            .email("contact_email", &self.contact.email)
            .required("location", &self.place)
            .required("province", &self.province)
            .required("breed", &self.breed)
            .present("pet_type", self.category.as_ref())
            .present("event_date", self.event_date.as_ref())
            .custom("colors", || {
                self.colors().is_empty().then(|| "Pick at least one color".to_string())
            })
            .count("photos", self.photos.len(), 0, config.max_photos);

        if !self.contact.phone.trim().is_empty() {
            v = v.phone("contact_phone", &self.contact.phone);
        }
        if let Some(date) = self.event_date {
            v = v.not_after("event_date", date, today);
        }
        if let Some(reward) = self.reward {
            v = v.non_negative("reward", reward).custom("reward", || {
                (self.kind == ReportKind::Found).then(|| "Rewards are only offered on lost reports".to_string())
            });
        }
        if let Some(coordinate) = self.coordinate {
            v = v.custom("coordinate", || {
                (!coordinate.is_valid()).then(|| format!("Pin {coordinate} is outside the map"))
            });
        }
        for (index, photo) in self.photos.iter().enumerate() {
            let field = format!("photos[{index}]");
            v = v
                .custom(&field, || {
                    (!photo.is_image()).then(|| format!("{} is not an image", photo.file_name))
                })
                .custom(&field, || {
                    (photo.bytes.len() > config.max_photo_bytes).then(|| {
                        format!(
                            "{} is larger than {} MB",
                            photo.file_name,
                            config.max_photo_bytes / (1024 * 1024)
                        )
                    })
                });
        }

        v.validate().into_result()
    }

    /// Row to insert. Only meaningful once [`validate`](Self::validate) passed.
    fn to_new_report(&self, owner: Option<String>) -> pawfinder_core::Result<NewReport> {
        let (Some(category), Some(event_date)) = (self.category, self.event_date) else {
            return Err(CoreError::validation("pet type and date are required"));
        };
        Ok(NewReport {
            category,
            breed: self.breed.trim().to_string(),
            pattern: self.pattern.trim().to_string(),
            colors: self.colors(),
            event_date,
            reward: self.reward.filter(|_| self.kind == ReportKind::Lost),
            place: self.place.trim().to_string(),
            province: self.province.trim().to_string(),
            coordinate: self.coordinate,
            contact: Contact {
                name: self.contact.name.trim().to_string(),
                phone: self.contact.phone.trim().to_string(),
                email: self.contact.email.trim().to_string(),
            },
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            owner,
        })
    }
}

/// Backend writes needed to submit a report.
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Insert the report row; returns its id.
    async fn insert_report(&self, kind: ReportKind, report: &NewReport) -> Result<String, ApiError>;
    /// Upload a photo; returns the URL to store in the image row.
    async fn upload_photo(&self, bucket: &str, path: &str, photo: &PhotoUpload) -> Result<String, ApiError>;
    /// Insert the image rows.
    async fn insert_images(&self, kind: ReportKind, report_id: &str, urls: &[String]) -> Result<(), ApiError>;
    /// Remove uploaded objects.
    async fn remove_photos(&self, bucket: &str, paths: &[String]) -> Result<(), ApiError>;
    /// Delete the report row.
    async fn delete_report(&self, kind: ReportKind, report_id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl ReportBackend for PawfinderClient {
    async fn insert_report(&self, kind: ReportKind, report: &NewReport) -> Result<String, ApiError> {
        self.reports().insert(kind, report).await
    }

    async fn upload_photo(&self, bucket: &str, path: &str, photo: &PhotoUpload) -> Result<String, ApiError> {
        let storage = self.storage_bucket(bucket);
        let stored = storage.upload(path, photo.bytes.clone(), &photo.content_type).await?;
        Ok(storage.public_url(&stored))
    }

    async fn insert_images(&self, kind: ReportKind, report_id: &str, urls: &[String]) -> Result<(), ApiError> {
        self.images().insert(kind, report_id, urls).await
    }

    async fn remove_photos(&self, bucket: &str, paths: &[String]) -> Result<(), ApiError> {
        self.storage_bucket(bucket).remove(paths).await
    }

    async fn delete_report(&self, kind: ReportKind, report_id: &str) -> Result<(), ApiError> {
        self.reports().delete(kind, report_id).await
    }
}

/// Which write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStep {
    /// Inserting the report row
    InsertReport,
    /// Uploading the photo at this position (1-based)
    UploadPhoto(usize),
    /// Inserting the image rows
    InsertImages,
}

impl fmt::Display for SubmitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitStep::InsertReport => f.write_str("insert report"),
            SubmitStep::UploadPhoto(n) => write!(f, "upload photo {n}"),
            SubmitStep::InsertImages => f.write_str("insert images"),
        }
    }
}

/// Submission failure.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Form did not validate; nothing was written
    #[error("{0}")]
    Invalid(CoreError),

    /// A write failed and nothing is left behind
    #[error("{step} failed: {source}")]
    Failed {
        /// Failing write
        step: SubmitStep,
        /// Backend error
        #[source]
        source: ApiError,
    },

    /// A write failed and earlier writes remain
    #[error("{step} failed, report {kind}/{report_id} left in place: {source}")]
    Partial {
        /// Table the row is in
        kind: ReportKind,
        /// Id of the row left behind
        report_id: String,
        /// Storage paths left behind
        uploaded: Vec<String>,
        /// Failing write
        step: SubmitStep,
        /// Backend error
        #[source]
        source: ApiError,
    },
}

impl SubmitError {
    /// Message to show the person who filled the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::Invalid(_) => "Please correct the highlighted fields.",
            SubmitError::Failed { .. } | SubmitError::Partial { .. } => {
                "Your report could not be submitted. Please try again."
            }
        }
    }

    /// Field errors, for invalid forms.
    pub fn field_errors(&self) -> &[pawfinder_core::validation::ValidationError] {
        match self {
            SubmitError::Invalid(err) => &err.fields,
            _ => &[],
        }
    }
}

impl From<SubmitError> for CoreError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(inner) => inner,
            SubmitError::Failed { .. } => CoreError::new(ErrorCode::UploadFailed, err.to_string()),
            SubmitError::Partial { .. } => CoreError::new(ErrorCode::PartialWrite, err.to_string())
                .with_suggestion("Delete the leftover report and its photos, then resubmit"),
        }
    }
}

/// A stored report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    /// Table it went to
    pub kind: ReportKind,
    /// Row id
    pub report_id: String,
    /// Photo URLs, in upload order
    pub image_urls: Vec<String>,
}

/// Validates and writes report forms.
#[derive(Clone)]
pub struct Submitter {
    backend: Arc<dyn ReportBackend>,
    config: SubmitConfig,
}

impl Submitter {
    /// Submitter writing through `backend`.
    pub fn new(backend: Arc<dyn ReportBackend>, config: SubmitConfig) -> Self {
        Self { backend, config }
    }

    /// Submitter writing through `client`.
    pub fn from_client(client: &PawfinderClient, config: SubmitConfig) -> Self {
        Self::new(Arc::new(client.clone()), config)
    }

    /// Storage path of the `n`th (1-based) photo of a report.
    pub fn photo_path(kind: ReportKind, report_id: &str, n: usize, photo: &PhotoUpload) -> String {
        format!("{kind}/{report_id}/{n}.{}", photo.extension())
    }

    /// Validate `form` against `today`, then write it.
    pub async fn submit(
        &self,
        form: &ReportForm,
        owner: Option<String>,
        today: NaiveDate,
    ) -> Result<Submitted, SubmitError> {
        form.validate(&self.config, today).map_err(SubmitError::Invalid)?;
        let report = form.to_new_report(owner).map_err(SubmitError::Invalid)?;
        let kind = form.kind;

        let report_id = self
            .backend
            .insert_report(kind, &report)
            .await
            .map_err(|source| SubmitError::Failed {
                step: SubmitStep::InsertReport,
                source,
            })?;
        debug!(kind = %kind, report_id = %report_id, "Report row inserted");

        let mut uploaded = Vec::with_capacity(form.photos.len());
        let mut image_urls = Vec::with_capacity(form.photos.len());
        for (index, photo) in form.photos.iter().enumerate() {
            let n = index + 1;
            let path = Self::photo_path(kind, &report_id, n, photo);
            match self.backend.upload_photo(&self.config.bucket, &path, photo).await {
                Ok(url) => {
                    uploaded.push(path);
                    image_urls.push(url);
                }
                Err(source) => {
                    return Err(self
                        .orphaned(kind, report_id, uploaded, SubmitStep::UploadPhoto(n), source)
                        .await);
                }
            }
        }

        if let Err(source) = self.backend.insert_images(kind, &report_id, &image_urls).await {
            return Err(self
                .orphaned(kind, report_id, uploaded, SubmitStep::InsertImages, source)
                .await);
        }

        Event::new(
            "report.submitted",
            json!({ "kind": kind, "report_id": report_id, "photos": image_urls.len() }),
        )
        .log();

        Ok(Submitted {
            kind,
            report_id,
            image_urls,
        })
    }

    /// Apply the orphan policy after `step` failed with the report row in place.
    async fn orphaned(
        &self,
        kind: ReportKind,
        report_id: String,
        uploaded: Vec<String>,
        step: SubmitStep,
        source: ApiError,
    ) -> SubmitError {
        warn!(
            kind = %kind,
            report_id = %report_id,
            step = %step,
            error = %source,
            policy = ?self.config.orphan_policy,
            "Submission failed after the report row was written"
        );

        if self.config.orphan_policy == OrphanPolicy::Keep {
            return SubmitError::Partial {
                kind,
                report_id,
                uploaded,
                step,
                source,
            };
        }

        let removed = self.backend.remove_photos(&self.config.bucket, &uploaded).await;
        let deleted = self.backend.delete_report(kind, &report_id).await;
        match (removed, deleted) {
            (Ok(()), Ok(())) => {
                info!(kind = %kind, report_id = %report_id, photos = uploaded.len(), "Rolled back partial report");
                SubmitError::Failed { step, source }
            }
            (removed, deleted) => {
                warn!(
                    kind = %kind,
                    report_id = %report_id,
                    remove_error = ?removed.err().map(|e| e.to_string()),
                    delete_error = ?deleted.err().map(|e| e.to_string()),
                    "Rollback incomplete"
                );
                SubmitError::Partial {
                    kind,
                    report_id,
                    uploaded,
                    step,
                    source,
                }
            }
        }
    }
}
