//! Configuration types for the alerter service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the delivery server
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// JSONP callback name sent with the count request
    #[serde(default = "default_callback")]
    pub callback: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,
    /// Seconds without a successful fetch before the connectivity alert raises
    #[serde(default = "default_connectivity_threshold")]
    pub connectivity_threshold_seconds: u64,
    #[serde(default)]
    pub geofence: GeofenceConfig,
    /// Path of the durable key/value store file
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            callback: default_callback(),
            poll_interval_seconds: default_poll_interval(),
            initial_delay_seconds: default_initial_delay(),
            connectivity_threshold_seconds: default_connectivity_threshold(),
            geofence: GeofenceConfig::default(),
            store_path: default_store_path(),
        }
    }
}

/// Search area for the deliveries-in-range query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceConfig {
    #[serde(default = "default_lat")]
    pub lat: f64,
    #[serde(default = "default_lng")]
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub radius_degrees: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            lat: default_lat(),
            lng: default_lng(),
            radius_degrees: default_radius(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:5000".to_string()
}

fn default_callback() -> String {
    "alerter".to_string()
}

fn default_poll_interval() -> u64 {
    7
}

fn default_initial_delay() -> u64 {
    3
}

fn default_connectivity_threshold() -> u64 {
    5 * 60
}

fn default_lat() -> f64 {
    32.0853
}

fn default_lng() -> f64 {
    34.781768
}

fn default_radius() -> f64 {
    0.045
}

fn default_store_path() -> PathBuf {
    PathBuf::from("alerter-state.json")
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::AlerterError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
