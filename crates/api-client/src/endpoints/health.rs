//! Health check endpoints

use crate::client::{PawfinderClient, Service};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;

/// Health check API interface
#[derive(Clone)]
pub struct HealthApi {
    client: PawfinderClient,
}

impl HealthApi {
    /// Create a new health API interface
    pub(crate) fn new(client: PawfinderClient) -> Self {
        Self { client }
    }

    /// Health URL of each service
    #[must_use]
    pub fn endpoints(&self) -> Vec<(Service, String)> {
        let config = self.client.config();
        vec![
            (Service::Rest, config.rest_url("")),
            (Service::Storage, config.storage_url("status")),
            (Service::Auth, config.auth_url("health")),
        ]
    }

    /// Probe every service concurrently.
    pub async fn check(&self) -> HealthReport {
        let probes = self
            .endpoints()
            .into_iter()
            .map(|(service, url)| async move { self.check_endpoint(service, &url).await });
        HealthReport {
            services: join_all(probes).await,
        }
    }

    /// Probe one URL; failures become an unhealthy status.
    pub async fn check_endpoint(&self, service: Service, url: &str) -> EndpointStatus {
        match self.client.probe(service, url).await {
            Ok(status) => status,
            Err(e) => EndpointStatus {
                service,
                url: url.to_string(),
                status_code: None,
                response_time: Duration::ZERO,
                is_healthy: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Status of one service.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStatus {
    /// Which service
    #[serde(serialize_with = "service_name")]
    pub service: Service,
    /// URL that was checked
    pub url: String,
    /// HTTP status code, when a response arrived
    pub status_code: Option<u16>,
    /// Response time
    pub response_time: Duration,
    /// Whether the endpoint is healthy
    pub is_healthy: bool,
    /// Why no response arrived
    pub error: Option<String>,
}

fn service_name<S: serde::Serializer>(service: &Service, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(service.as_str())
}

/// Status of all services.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// One entry per service
    pub services: Vec<EndpointStatus>,
}

impl HealthReport {
    /// Whether every service answered successfully
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.services.iter().all(|s| s.is_healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn test_endpoints() {
        let client = PawfinderClient::with_config(ClientConfig::development()).unwrap();
        let endpoints = client.health().endpoints();
        assert_eq!(endpoints.len(), 3);
        assert_eq!(endpoints[0].1, "http://localhost:54321/rest/v1/");
        assert_eq!(endpoints[1].1, "http://localhost:54321/storage/v1/status");
        assert_eq!(endpoints[2].1, "http://localhost:54321/auth/v1/health");
    }

    #[test]
    fn test_report_health() {
        let status = |healthy| EndpointStatus {
            service: Service::Rest,
            url: "http://x".into(),
            status_code: Some(if healthy { 200 } else { 503 }),
            response_time: Duration::from_millis(12),
            is_healthy: healthy,
            error: None,
        };
        assert!(HealthReport {
            services: vec![status(true), status(true)]
        }
        .is_healthy());
        assert!(!HealthReport {
            services: vec![status(true), status(false)]
        }
        .is_healthy());

        let json = serde_json::to_value(status(true)).unwrap();
        assert_eq!(json["service"], "rest");
    }
}
