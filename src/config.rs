//! Dashboard configuration
//!
//! Loads optional settings from a JSON file.
//!
//! Search order:
//! 1. Path in the `COLLISIONS_CONFIG` environment variable
//! 2. `collisions.json` in the working directory
//! 3. Built-in defaults
//!
//! All fields are optional.

use crate::charts::HexagonLayer;
use crate::data::{GeoPoint, RowLimit};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "COLLISIONS_CONFIG";
pub const CONFIG_FILE: &str = "collisions.json";

pub const DEFAULT_DATA_URL: &str =
    "https://drive.google.com/uc?export=download&id=1EvaV2rm0DC2glPjRz_kA0MXn2eIGm5y5";

/// Map center used when a selection has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for MapCenter {
    fn default() -> Self {
        Self {
            latitude: 40.7128,
            longitude: -74.0060,
        }
    }
}

impl From<MapCenter> for GeoPoint {
    fn from(c: MapCenter) -> Self {
        GeoPoint::new(c.latitude, c.longitude)
    }
}

/// Dashboard configuration loaded from a JSON config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// CSV resource holding the collision records
    pub data_url: String,

    /// Number of records read from the resource (default: 100000)
    pub row_limit: usize,

    /// HTTP timeout in seconds (default: 60)
    pub fetch_timeout_secs: u64,

    /// Extra attempts after a failed fetch (default: 1)
    pub fetch_retries: u32,

    /// Cache entry lifetime; unset keeps entries for the whole process
    pub cache_ttl_secs: Option<u64>,

    /// Map center for empty selections
    pub default_center: MapCenter,

    /// Density map parameters
    pub hexagon: HexagonLayer,

    /// Rows in the Overview preview (default: 5)
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            row_limit: 100_000,
            fetch_timeout_secs: 60,
            fetch_retries: 1,
            cache_ttl_secs: None,
            default_center: MapCenter::default(),
            hexagon: HexagonLayer::default(),
            preview_rows: 5,
        }
    }
}

impl DashboardConfig {
    /// Load from an explicit JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the config path from `env_value` or `dir`, falling back to defaults.
    pub fn discover(env_value: Option<PathBuf>, dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = env_value {
            return Ok((Self::load_from_file(&path)?, Some(path)));
        }

        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            return Ok((Self::load_from_file(&candidate)?, Some(candidate)));
        }

        Ok((Self::default(), None))
    }

    /// Load using `COLLISIONS_CONFIG` and the current directory.
    pub fn load() -> Result<(Self, Option<PathBuf>)> {
        let env_value = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let dir = std::env::current_dir().context("failed to read working directory")?;
        Self::discover(env_value, &dir)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_url.trim().is_empty() {
            bail!("data_url must not be empty");
        }
        if self.row_limit == 0 {
            bail!("row_limit must be positive");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be positive");
        }
        if self.cache_ttl_secs == Some(0) {
            bail!("cache_ttl_secs must be positive; omit it to keep data for the whole session");
        }
        if !(self.hexagon.radius_m > 0.0) {
            bail!("hexagon.radius_m must be positive, got {}", self.hexagon.radius_m);
        }
        let [low, high] = self.hexagon.elevation_range;
        if low > high {
            bail!("hexagon.elevation_range is inverted: [{low}, {high}]");
        }
        if self.preview_rows == 0 {
            bail!("preview_rows must be positive");
        }
        Ok(())
    }

    pub fn row_limit(&self) -> Result<RowLimit> {
        Ok(RowLimit::new(self.row_limit)?)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}
