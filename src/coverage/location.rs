//! Device location as an injected capability.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::GeoPoint;
use crate::settings::LocationSettings;

/// Sensor request options. The defaults ask for a fresh, high-accuracy fix
/// within ten seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position that may be returned. Zero disables the cache.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("location error code {0}")]
    Other(u16),
}

impl LocationError {
    /// Maps a sensor error code. Codes other than 1, 2 and 3 become `Other`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::PositionUnavailable,
            3 => LocationError::Timeout,
            other => LocationError::Other(other),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Location permission denied.",
            LocationError::PositionUnavailable => "Location unavailable.",
            LocationError::Timeout => "Location request timed out.",
            LocationError::Unsupported => "Geolocation is not supported on this system.",
            LocationError::Other(_) => "Could not get your location.",
        }
    }
}

pub trait LocationProvider {
    fn current_position(&self, opts: &PositionOptions) -> Result<GeoPoint, LocationError>;
}

/// A position supplied up front, e.g. from command-line flags.
pub struct FixedLocation(pub GeoPoint);

impl LocationProvider for FixedLocation {
    fn current_position(&self, _opts: &PositionOptions) -> Result<GeoPoint, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from an IP geolocation service.
pub struct IpLocation {
    endpoint: String,
    enabled: bool,
}

#[derive(Deserialize)]
struct IpLocationResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocation {
    pub fn new(settings: &LocationSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            enabled: settings.enabled,
        }
    }
}

impl LocationProvider for IpLocation {
    fn current_position(&self, opts: &PositionOptions) -> Result<GeoPoint, LocationError> {
        if !self.enabled {
            return Err(LocationError::PermissionDenied);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|_| LocationError::Unsupported)?;

        info!(endpoint = %self.endpoint, timeout_ms = opts.timeout.as_millis() as u64, "requesting position");
        let resp = client.get(&self.endpoint).send().map_err(|e| {
            warn!(error = %e, "position request failed");
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::PositionUnavailable
            }
        })?;

        let body: IpLocationResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::PositionUnavailable
            }
        })?;
        parse_position(body)
    }
}

fn parse_position(body: IpLocationResponse) -> Result<GeoPoint, LocationError> {
    match (body.status.as_str(), body.lat, body.lon) {
        ("success", Some(lat), Some(lon)) => Ok(GeoPoint::new(lat, lon)),
        _ => Err(LocationError::PositionUnavailable),
    }
}
