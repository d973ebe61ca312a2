//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one part of the Supabase backend.
//!
//! | Module | Backend path | Description |
//! |--------|--------------|-------------|
//! | `reports` | `/rest/v1/lost_pets`, `/rest/v1/found_pets` | Report rows |
//! | `images` | `/rest/v1/lost_pet_images`, `/rest/v1/found_pet_images` | Photo URLs per report |
//! | `storage` | `/storage/v1/...` | Photo uploads and buckets |
//! | `auth` | `/auth/v1/...` | Sign-up, sign-in, sign-out |
//! | `health` | all three | Reachability probes |

pub mod auth;
pub mod health;
pub mod images;
pub mod reports;
pub mod storage;

pub use auth::AuthApi;
pub use health::{EndpointStatus, HealthApi, HealthReport};
pub use images::ImagesApi;
pub use reports::{NewReport, ReportQuery, ReportsApi};
pub use storage::{Bucket, StorageApi};
