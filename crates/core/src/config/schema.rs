//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSchema {
    /// Ranking and pagination defaults
    #[serde(default)]
    pub search: SearchConfig,

    /// Geolocation chain and place search
    #[serde(default)]
    pub locate: LocateConfig,

    /// Report listing and image loading
    #[serde(default)]
    pub feed: FeedConfig,

    /// Report submission
    #[serde(default)]
    pub submit: SubmitConfig,

    /// Map rendering hints
    #[serde(default)]
    pub map: MapConfig,
}

/// Ranking and pagination defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Reports per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Sort mode name (`reward_desc`, `date_desc`, `distance_asc`, ...).
    /// Unrecognised names fall back to newest first.
    #[serde(default = "default_sort")]
    pub default_sort: String,

    /// Timestamp used by date sorting: `event` (date lost/found) or `created`
    #[serde(default = "default_date_key")]
    pub date_key: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: default_sort(),
            date_key: default_date_key(),
        }
    }
}

fn default_page_size() -> usize {
    12
}

fn default_sort() -> String {
    "date_desc".to_string()
}

fn default_date_key() -> String {
    "event".to_string()
}

/// Geolocation chain and place search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocateConfig {
    /// Timeout for the high-accuracy device fix, in milliseconds
    #[serde(default = "default_high_accuracy_timeout_ms")]
    pub high_accuracy_timeout_ms: u64,

    /// Timeout for the low-accuracy device fix, in milliseconds
    #[serde(default = "default_low_accuracy_timeout_ms")]
    pub low_accuracy_timeout_ms: u64,

    /// Timeout for the IP lookup, in milliseconds
    #[serde(default = "default_ip_timeout_ms")]
    pub ip_timeout_ms: u64,

    /// IP geolocation endpoint returning JSON with latitude/longitude/city
    #[serde(default = "default_ip_endpoint")]
    pub ip_endpoint: String,

    /// Idle gap before a place search is sent, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Geocoder endpoint for place-name search
    #[serde(default = "default_geocoder_endpoint")]
    pub geocoder_endpoint: String,

    /// ISO country code place search is restricted to
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            high_accuracy_timeout_ms: default_high_accuracy_timeout_ms(),
            low_accuracy_timeout_ms: default_low_accuracy_timeout_ms(),
            ip_timeout_ms: default_ip_timeout_ms(),
            ip_endpoint: default_ip_endpoint(),
            search_debounce_ms: default_debounce_ms(),
            geocoder_endpoint: default_geocoder_endpoint(),
            country_code: default_country_code(),
        }
    }
}

fn default_high_accuracy_timeout_ms() -> u64 {
    15_000
}

fn default_low_accuracy_timeout_ms() -> u64 {
    10_000
}

fn default_ip_timeout_ms() -> u64 {
    8_000
}

fn default_ip_endpoint() -> String {
    "https://ipapi.co/json/".to_string()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_geocoder_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_country_code() -> String {
    "th".to_string()
}

/// Report listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Per-report image fetch timeout, in milliseconds
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,

    /// Maximum rows fetched per listing
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            image_timeout_ms: default_image_timeout_ms(),
            list_limit: default_list_limit(),
        }
    }
}

fn default_image_timeout_ms() -> u64 {
    5_000
}

fn default_list_limit() -> u32 {
    200
}

/// What to do with an inserted report when a later submission step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Remove uploaded photos and delete the inserted record
    #[default]
    Compensate,
    /// Leave the record in place for manual cleanup
    Keep,
}

/// Report submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Handling of half-written reports
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,

    /// Maximum photos per report
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,

    /// Maximum size of a single photo, in bytes
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: usize,

    /// Storage bucket for report photos
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            orphan_policy: OrphanPolicy::default(),
            max_photos: default_max_photos(),
            max_photo_bytes: default_max_photo_bytes(),
            bucket: default_bucket(),
        }
    }
}

fn default_max_photos() -> usize {
    5
}

fn default_max_photo_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_bucket() -> String {
    "pet-images".to_string()
}

/// Map rendering hints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Tile URL template with `{z}`, `{x}`, `{y}` placeholders
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    /// Initial map center when no location is known (latitude, longitude)
    #[serde(default = "default_center")]
    pub default_center: (f64, f64),
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: default_tile_url(),
            default_center: default_center(),
        }
    }
}

fn default_tile_url() -> String {
    "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_center() -> (f64, f64) {
    // Bangkok
    (13.7563, 100.5018)
}
