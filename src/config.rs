use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::boundaries::AxisOrder;
use crate::pip::DEFAULT_BANDS;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub boundaries: BoundariesConfig,
    pub nearby: NearbyConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct BoundariesConfig {
    /// JSON file of boundary records
    pub file: Option<PathBuf>,
    /// Boundaries endpoint returning the same JSON
    pub url: Option<String>,
    pub axis_order: AxisOrder,
    /// Re-fetch interval for `url` sources; no refresh when unset
    pub refresh_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NearbyConfig {
    /// Radius bands in meters
    pub bands: Vec<u32>,
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            bands: DEFAULT_BANDS.to_vec(),
        }
    }
}

/// Where boundary records are loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundarySource {
    File(PathBuf),
    Url(String),
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}

impl BoundariesConfig {
    /// The single configured boundary source
    pub fn source(&self) -> Result<BoundarySource> {
        match (&self.file, &self.url) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Configure either boundaries.file or boundaries.url, not both")
            }
            (Some(file), None) => Ok(BoundarySource::File(file.clone())),
            (None, Some(url)) => Ok(BoundarySource::Url(url.clone())),
            (None, None) => {
                anyhow::bail!("No boundary source configured (boundaries.file or boundaries.url)")
            }
        }
    }
}
