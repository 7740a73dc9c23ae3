//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use geo::{coord, Rect};
use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project hosting the Firestore database
    pub gcp_project_id: String,
    /// Signed-in user (the auth provider is external)
    pub user_id: Option<String>,
    /// Path of the local preference file
    pub store_path: PathBuf,
    /// Map is embedded in a parent frame for meetup-location picking
    pub embedded: bool,
    /// Campus extent in lon/lat, used to place geolocation fixes
    pub campus_bounds: Option<Rect<f64>>,
    /// Unscaled map surface width in pixels
    pub map_width: f64,
    /// Unscaled map surface height in pixels
    pub map_height: f64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            user_id: None,
            store_path: PathBuf::from("clustr-store.json"),
            embedded: false,
            campus_bounds: None,
            map_width: 1000.0,
            map_height: 700.0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let campus_bounds = match env::var("CLUSTR_CAMPUS_BOUNDS") {
            Ok(raw) => Some(parse_campus_bounds(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            user_id: env::var("CLUSTR_USER_ID")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            store_path: env::var("CLUSTR_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("clustr-store.json")),
            embedded: env::var("CLUSTR_EMBEDDED")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            campus_bounds,
            map_width: parse_dimension("CLUSTR_MAP_WIDTH", 1000.0)?,
            map_height: parse_dimension("CLUSTR_MAP_HEIGHT", 700.0)?,
        })
    }

    /// The signed-in user, required by the snapshot binary.
    pub fn require_user_id(&self) -> Result<&str, ConfigError> {
        self.user_id
            .as_deref()
            .ok_or(ConfigError::Missing("CLUSTR_USER_ID"))
    }
}

fn parse_dimension(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v > 0.0 => Ok(v),
            _ => Err(ConfigError::Invalid(name, raw)),
        },
        Err(_) => Ok(default),
    }
}

/// Parse `min_lon,min_lat,max_lon,max_lat`.
fn parse_campus_bounds(raw: &str) -> Result<Rect<f64>, ConfigError> {
    let invalid = || ConfigError::Invalid("CLUSTR_CAMPUS_BOUNDS", raw.to_string());

    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match parts.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] if min_lon < max_lon && min_lat < max_lat => {
            Ok(Rect::new(
                coord! { x: *min_lon, y: *min_lat },
                coord! { x: *max_lon, y: *max_lat },
            ))
        }
        _ => Err(invalid()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_campus_bounds() {
        let rect = parse_campus_bounds("-123.01, 49.24, -122.99, 49.26").unwrap();
        assert_eq!(rect.min().x, -123.01);
        assert_eq!(rect.max().y, 49.26);
    }

    #[test]
    fn test_parse_campus_bounds_rejects_inverted() {
        assert!(parse_campus_bounds("1,1,0,0").is_err());
        assert!(parse_campus_bounds("1,2,3").is_err());
        assert!(parse_campus_bounds("a,b,c,d").is_err());
    }

    #[test]
    fn test_require_user_id() {
        let mut config = Config::default();
        assert!(matches!(
            config.require_user_id(),
            Err(ConfigError::Missing("CLUSTR_USER_ID"))
        ));
        config.user_id = Some("abc".to_string());
        assert_eq!(config.require_user_id().unwrap(), "abc");
    }
}
