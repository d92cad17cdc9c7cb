use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::coverage::{default_zones, load_zones, CoverageZone, ZoneError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Zones(#[from] ZoneError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Where overview JSON and HTML files are written. `~` is expanded.
    pub output_dir: String,
    /// Optional TOML file with `[[zones]]`; the built-in zones are used otherwise.
    pub zones_file: Option<String>,
    pub geocoder: GeocoderSettings,
    pub location: LocationSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/Documents/sitekit".to_string(),
            zones_file: None,
            geocoder: GeocoderSettings::default(),
            location: LocationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub endpoint: String,
    /// Comma separated ISO 3166-1 alpha-2 codes the search is limited to.
    pub country_codes: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            country_codes: "za".to_string(),
            user_agent: concat!("sitekit/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://ip-api.com/json".to_string(),
        }
    }
}

impl AppSettings {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.output_dir))
    }

    pub fn zones(&self) -> Result<Vec<CoverageZone>, ConfigError> {
        match &self.zones_file {
            Some(file) => Ok(load_zones(Path::new(&expand_home_dir(file)))?),
            None => Ok(default_zones()),
        }
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "sitekit", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

/// Reads settings from `path`, falling back to defaults when the file is absent.
pub fn load_settings(path: &Path) -> Result<AppSettings, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(AppSettings::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io { path: path.to_path_buf(), source };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    fs::write(path, toml_str).map_err(io_err)?;
    Ok(())
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
