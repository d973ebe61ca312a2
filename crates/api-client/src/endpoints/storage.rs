//! Object storage

use crate::client::{ApiRequest, PawfinderClient, Service};
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// A storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket id
    pub id: String,
    /// Bucket name
    pub name: String,
    /// Whether objects are readable without a token
    #[serde(default)]
    pub public: bool,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Storage API interface bound to one bucket
#[derive(Clone)]
pub struct StorageApi {
    client: PawfinderClient,
    bucket: String,
}

impl StorageApi {
    /// Create a new storage API interface
    pub(crate) fn new(client: PawfinderClient, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Bucket this interface writes to
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, path: &str) -> String {
        self.client
            .config()
            .storage_url(&format!("object/{}/{}", self.bucket, path.trim_start_matches('/')))
    }

    /// Upload an object; returns the stored path.
    pub async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> ApiResult<String> {
        let size = bytes.len();
        let request = ApiRequest::post(Service::Storage, self.object_url(path))
            .header("x-upsert", "false")
            .bytes(bytes, content_type);

        self.client.send_empty(&request).await?;
        debug!(bucket = %self.bucket, path = %path, bytes = size, "Uploaded object");
        Ok(path.trim_start_matches('/').to_string())
    }

    /// URL an uploaded object can be read from when the bucket is public.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.client
            .config()
            .storage_url(&format!("object/public/{}/{}", self.bucket, path.trim_start_matches('/')))
    }

    /// Remove objects by path.
    pub async fn remove(&self, paths: &[String]) -> ApiResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = self.client.config().storage_url(&format!("object/{}", self.bucket));
        let request = ApiRequest::delete(Service::Storage, url).json(&json!({ "prefixes": paths }))?;
        self.client.send_empty(&request).await
    }

    /// All buckets in the project.
    pub async fn list_buckets(&self) -> ApiResult<Vec<Bucket>> {
        let request = ApiRequest::get(Service::Storage, self.client.config().storage_url("bucket"));
        self.client.send_json(&request).await
    }

    /// Create a bucket.
    pub async fn create_bucket(&self, name: &str, public: bool) -> ApiResult<()> {
        let request = ApiRequest::post(Service::Storage, self.client.config().storage_url("bucket"))
            .json(&json!({ "id": name, "name": name, "public": public }))?;
        self.client.send_empty(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_object_urls() {
        let client = PawfinderClient::with_config(ClientConfig::development()).unwrap();
        let storage = client.storage();
        assert_eq!(storage.bucket(), "pet-images");
        assert_eq!(
            storage.object_url("lost/42/1.jpg"),
            "http://localhost:54321/storage/v1/object/pet-images/lost/42/1.jpg"
        );
        assert_eq!(
            storage.public_url("/lost/42/1.jpg"),
            "http://localhost:54321/storage/v1/object/public/pet-images/lost/42/1.jpg"
        );
        assert_eq!(client.storage_bucket("avatars").bucket(), "avatars");
    }

    #[test]
    fn test_bucket_deserialize() {
        let json = r#"[{"id": "pet-images", "name": "pet-images", "public": true, "owner": null}]"#;
        let buckets: Vec<Bucket> = serde_json::from_str(json).unwrap();
        assert!(buckets[0].public);
        assert_eq!(buckets[0].created_at, None);
    }
}
