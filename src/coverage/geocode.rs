//! Free-text address lookup against a Nominatim-style search endpoint.

use std::time::Duration;

use reqwest::blocking::Request;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::GeoPoint;
use crate::settings::GeocoderSettings;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("empty address")]
    EmptyQuery,
    #[error("no results for '{0}'")]
    NotFound(String),
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoder returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable geocoder response: {0}")]
    Parse(String),
}

impl LookupError {
    /// Message shown to the user in place of the result.
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::EmptyQuery => "Please enter an address to search.",
            LookupError::NotFound(_) => {
                "Address not found. Please try being more specific (e.g., include suburb or city)."
            }
            LookupError::Transport(_) | LookupError::Status { .. } | LookupError::Parse(_) => {
                "An error occurred while searching. Please try again."
            }
        }
    }
}

pub trait Geocoder {
    /// Candidates for `query`, best match first.
    fn lookup(&self, query: &str) -> Result<Vec<GeoPoint>, LookupError>;

    /// The first candidate, taken as ground truth.
    fn locate(&self, query: &str) -> Result<GeoPoint, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }
        self.lookup(query)?
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(query.to_string()))
    }
}

fn coordinate(candidate: &Value, key: &str) -> Option<f64> {
    match candidate.get(key)? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn candidate_point(candidate: &Value) -> Option<GeoPoint> {
    Some(GeoPoint::new(coordinate(candidate, "lat")?, coordinate(candidate, "lon")?))
}

/// Parses a search response body: a JSON array of objects with string `lat`/`lon`.
///
/// Only the first candidate has to carry usable coordinates. Later ones without
/// them are skipped.
pub fn parse_candidates(body: &str) -> Result<Vec<GeoPoint>, LookupError> {
    let candidates: Vec<Value> =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;

    let mut iter = candidates.iter();
    let Some(first) = iter.next() else {
        return Ok(Vec::new());
    };
    let first = candidate_point(first)
        .ok_or_else(|| LookupError::Parse(format!("bad coordinates in first result: {first}")))?;

    let mut points = vec![first];
    points.extend(iter.filter_map(candidate_point));
    Ok(points)
}

pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
    country_codes: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, LookupError> {
        // No timeout unless configured.
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout_secs.map(Duration::from_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            country_codes: settings.country_codes.clone(),
            user_agent: settings.user_agent.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn search_request(&self, query: &str) -> Result<Request, LookupError> {
        let request = self
            .client
            .get(&self.endpoint)
            .header(USER_AGENT, self.user_agent.as_str())
            .query(&[
                ("format", "json"),
                ("q", query),
                ("countrycodes", self.country_codes.as_str()),
            ])
            .build()?;
        Ok(request)
    }
}

impl Geocoder for NominatimGeocoder {
    fn lookup(&self, query: &str) -> Result<Vec<GeoPoint>, LookupError> {
        info!(endpoint = %self.endpoint, query, countrycodes = %self.country_codes, "geocoding address");

        let resp = self.client.execute(self.search_request(query)?)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            warn!(status = status.as_u16(), "geocoder request rejected");
            return Err(LookupError::Status { status: status.as_u16(), body });
        }

        let body = resp.text()?;
        let candidates = parse_candidates(&body)?;
        info!(count = candidates.len(), "geocoder answered");
        Ok(candidates)
    }
}
