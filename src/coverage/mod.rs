//! Coverage zones and the point-in-polygon classifier.
//!
//! A zone is a closed polygon of `(lat, lng)` vertices. Classification uses the
//! even-odd (ray casting) rule with a ray cast along the latitude axis.

pub mod geocode;
pub mod location;
pub mod session;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slug::slugify;
use thiserror::Error;
use tracing::debug;

/// Collinearity tolerance used when deciding whether a point sits on an edge.
const EDGE_EPSILON: f64 = 1e-12;

/// Center of Springs, Gauteng.
pub const MAP_CENTER: GeoPoint = GeoPoint { lat: -26.2540, lng: 28.4406 };
pub const DEFAULT_ZOOM: u8 = 13;
pub const FOCUS_ZOOM: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageZone {
    pub id: String,
    pub name: String,
    pub coordinates: Vec<GeoPoint>,
    pub color: String,
}

impl CoverageZone {
    pub fn validate(&self) -> Result<(), ZoneError> {
        if self.coordinates.len() < 3 {
            return Err(ZoneError::TooFewPoints {
                id: self.id.clone(),
                count: self.coordinates.len(),
            });
        }
        Ok(())
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        is_inside(point, &self.coordinates)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageResult {
    Covered,
    NotCovered,
}

impl fmt::Display for CoverageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageResult::Covered => f.write_str("covered"),
            CoverageResult::NotCovered => f.write_str("not covered"),
        }
    }
}

/// What a map renderer is asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    pub marker: Option<GeoPoint>,
}

impl Default for MapView {
    fn default() -> Self {
        Self { center: MAP_CENTER, zoom: DEFAULT_ZOOM, marker: None }
    }
}

impl MapView {
    pub fn focused_on(point: GeoPoint) -> Self {
        Self { center: point, zoom: FOCUS_ZOOM, marker: Some(point) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub point: GeoPoint,
    pub result: CoverageResult,
    /// Id of the zone that matched, if any.
    pub zone: Option<String>,
    pub view: MapView,
}

#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("failed to read zones file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid zones file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("zone '{id}' has {count} points, at least 3 are required")]
    TooFewPoints { id: String, count: usize },
    #[error("duplicate zone id '{0}'")]
    DuplicateId(String),
}

/// Even-odd point-in-polygon test.
///
/// The polygon is implicitly closed. Points lying on an edge or a vertex count as
/// inside. Polygons with fewer than three vertices enclose nothing.
pub fn is_inside(point: GeoPoint, polygon: &[GeoPoint]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (x, y) = (point.lat, point.lng);
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if on_segment(point, a, b) {
            return true;
        }

        let (xi, yi) = (a.lat, a.lng);
        let (xj, yj) = (b.lat, b.lng);
        // Horizontal edges never satisfy the first clause, so they never divide by zero.
        let crosses = ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi);
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> bool {
    let cross = (b.lat - a.lat) * (p.lng - a.lng) - (b.lng - a.lng) * (p.lat - a.lat);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
        && p.lng >= a.lng.min(b.lng)
        && p.lng <= a.lng.max(b.lng)
}

/// Returns the first zone containing `point`. Zone order decides overlaps.
pub fn resolve_zone(point: GeoPoint, zones: &[CoverageZone]) -> Option<&CoverageZone> {
    let hit = zones.iter().find(|zone| zone.contains(point));
    debug!(%point, zone = hit.map(|z| z.id.as_str()), "classified point");
    hit
}

pub fn resolve(point: GeoPoint, zones: &[CoverageZone]) -> CoverageResult {
    match resolve_zone(point, zones) {
        Some(_) => CoverageResult::Covered,
        None => CoverageResult::NotCovered,
    }
}

/// Classifies `point` and builds the report a caller displays.
pub fn check(point: GeoPoint, zones: &[CoverageZone]) -> CoverageReport {
    let zone = resolve_zone(point, zones).map(|z| z.id.clone());
    CoverageReport {
        point,
        result: if zone.is_some() { CoverageResult::Covered } else { CoverageResult::NotCovered },
        zone,
        view: MapView::focused_on(point),
    }
}

pub fn default_zones() -> Vec<CoverageZone> {
    vec![CoverageZone {
        id: "springs-central".to_string(),
        name: "Springs Central Coverage".to_string(),
        color: "#0066FF".to_string(),
        coordinates: vec![
            GeoPoint::new(-26.2300, 28.4100),
            GeoPoint::new(-26.2300, 28.4700),
            GeoPoint::new(-26.2800, 28.4700),
            GeoPoint::new(-26.2800, 28.4100),
        ],
    }]
}

// ==========================================
// Zones file
// ==========================================

#[derive(Debug, Deserialize)]
struct ZonesFile {
    #[serde(default)]
    zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    id: Option<String>,
    name: String,
    color: Option<String>,
    /// `[lat, lng]` pairs.
    coordinates: Vec<[f64; 2]>,
}

pub fn parse_zones(content: &str) -> Result<Vec<CoverageZone>, ZoneError> {
    let file: ZonesFile = toml::from_str(content)?;
    let mut seen = HashSet::new();
    let mut zones = Vec::with_capacity(file.zones.len());

    for entry in file.zones {
        let id = match entry.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => slugify(&entry.name),
        };
        if !seen.insert(id.clone()) {
            return Err(ZoneError::DuplicateId(id));
        }

        let zone = CoverageZone {
            id,
            name: entry.name,
            color: entry.color.unwrap_or_else(|| "#0066FF".to_string()),
            coordinates: entry
                .coordinates
                .into_iter()
                .map(|[lat, lng]| GeoPoint::new(lat, lng))
                .collect(),
        };
        zone.validate()?;
        zones.push(zone);
    }
    Ok(zones)
}

pub fn load_zones(path: &Path) -> Result<Vec<CoverageZone>, ZoneError> {
    let content = fs::read_to_string(path).map_err(|source| ZoneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let zones = parse_zones(&content)?;
    debug!(path = %path.display(), count = zones.len(), "loaded coverage zones");
    Ok(zones)
}
