//! Location sources the fallback chain draws on.

use crate::error::{LocateError, Result};
use async_trait::async_trait;
use pawfinder_geo::Coordinate;
use serde::Deserialize;
use std::time::Duration;

/// Platform location hardware or OS service.
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    /// Produce a fix. `high_accuracy` asks for GPS-grade precision.
    async fn current_position(&self, high_accuracy: bool) -> Result<Coordinate>;
}

/// A device that always reports the same coordinate (configured home, CLI flag).
#[derive(Debug, Clone, Copy)]
pub struct FixedDevice {
    coordinate: Coordinate,
    precise: bool,
}

impl FixedDevice {
    /// Answers both high and low accuracy requests.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            precise: true,
        }
    }

    /// Answers only low accuracy requests, like a device without GPS.
    pub fn coarse(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            precise: false,
        }
    }
}

#[async_trait]
impl DeviceLocator for FixedDevice {
    async fn current_position(&self, high_accuracy: bool) -> Result<Coordinate> {
        if high_accuracy && !self.precise {
            return Err(LocateError::Unavailable("no high-accuracy source".into()));
        }
        if !self.coordinate.is_valid() {
            return Err(LocateError::Unavailable(format!(
                "configured coordinate {} is out of range",
                self.coordinate
            )));
        }
        Ok(self.coordinate)
    }
}

/// A host with no location hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

#[async_trait]
impl DeviceLocator for NoDevice {
    async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinate> {
        Err(LocateError::Unavailable("no location hardware".into()))
    }
}

/// Result of an IP lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct IpLocation {
    /// Approximate coordinate
    pub coordinate: Coordinate,
    /// City name, when the service knows it
    pub city: Option<String>,
}

/// IP geolocation service.
#[async_trait]
pub trait IpLocator: Send + Sync {
    /// Locate the caller's public IP.
    async fn locate(&self) -> Result<IpLocation>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// IP lookup against an ipapi.co style JSON endpoint.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    http: reqwest::Client,
    endpoint: String,
}

impl IpApiLocator {
    /// Build a locator for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pawfinder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Interpret a response body.
    pub fn parse(body: &str) -> Result<IpLocation> {
        let response: IpApiResponse =
            serde_json::from_str(body).map_err(|e| LocateError::InvalidResponse(e.to_string()))?;

        if response.error {
            return Err(LocateError::InvalidResponse(
                response.reason.unwrap_or_else(|| "lookup refused".to_string()),
            ));
        }

        let (Some(latitude), Some(longitude)) = (response.latitude, response.longitude) else {
            return Err(LocateError::InvalidResponse("missing latitude/longitude".into()));
        };
        let coordinate = Coordinate::try_new(latitude, longitude)
            .map_err(|e| LocateError::InvalidResponse(e.to_string()))?;

        Ok(IpLocation {
            coordinate,
            city: response.city.filter(|c| !c.trim().is_empty()),
        })
    }
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<IpLocation> {
        let response = self.http.get(&self.endpoint).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, endpoint = %self.endpoint, "IP lookup returned non-success");
            return Err(LocateError::Http(format!("{} returned {status}", self.endpoint)));
        }

        Self::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_device() {
        let here = Coordinate::new(13.7563, 100.5018);

        assert_eq!(FixedDevice::new(here).current_position(true).await, Ok(here));
        assert!(FixedDevice::coarse(here).current_position(true).await.is_err());
        assert_eq!(FixedDevice::coarse(here).current_position(false).await, Ok(here));

        let bogus = FixedDevice::new(Coordinate::new(120.0, 0.0));
        assert!(bogus.current_position(false).await.is_err());
    }

    #[test]
    fn test_no_device() {
        for high_accuracy in [true, false] {
            assert!(matches!(
                tokio_test::block_on(NoDevice.current_position(high_accuracy)),
                Err(LocateError::Unavailable(_))
            ));
        }
    }

    #[test]
    fn test_parse_ipapi_response() {
        let body = r#"{"ip": "1.2.3.4", "city": "Bangkok", "region": "Bangkok", "country": "TH", "latitude": 13.7563, "longitude": 100.5018}"#;
        let location = IpApiLocator::parse(body).unwrap();
        assert_eq!(location.city.as_deref(), Some("Bangkok"));
        assert_eq!(location.coordinate, Coordinate::new(13.7563, 100.5018));
    }

    #[test]
    fn test_parse_ipapi_error() {
        let body = r#"{"error": true, "reason": "RateLimited"}"#;
        assert_eq!(
            IpApiLocator::parse(body),
            Err(LocateError::InvalidResponse("RateLimited".into()))
        );
        assert!(IpApiLocator::parse(r#"{"city": "Bangkok"}"#).is_err());
        assert!(IpApiLocator::parse("<html>").is_err());
    }
}
