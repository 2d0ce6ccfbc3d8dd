//! Configuration management for `NewsMap` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::NewsMapError;
use crate::models::LatLng;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `NewsMap` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsMapConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    /// News search backend
    pub news: NewsConfig,
    /// Naver Maps geocoding credentials and endpoints
    pub naver: NaverConfig,
    pub weather: WeatherConfig,
    pub youtube: YoutubeConfig,
    pub routing: RoutingConfig,
    pub map: MapConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory with the built presentation layer
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds, applied to every external call
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NaverConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub geocode_url: String,
    pub reverse_geocode_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Only videos published within this many days are considered
    pub published_within_days: u32,
    /// Character count of the title used by the last fallback query
    pub truncated_title_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub transit_url: String,
    pub transit_api_key: Option<String>,
    pub driving_url: String,
    pub driving_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub default_center: LatLng,
    pub default_zoom: u8,
    /// Marker icons, assigned cyclically by (article + location) ordinal
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub location: String,
    /// Cache TTL in hours
    pub ttl_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint; traces are only exported when set
    pub otlp_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5173,
            static_dir: "frontend/dist".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for NaverConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            geocode_url: "https://naveropenapi.apigw.ntruss.com/map-geocode/v2/geocode"
                .to_string(),
            reverse_geocode_url: "https://naveropenapi.apigw.ntruss.com/map-reversegeocode/v2/gc"
                .to_string(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            published_within_days: 365,
            truncated_title_chars: 20,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            transit_url: "https://maps.googleapis.com/maps/api/directions/json".to_string(),
            transit_api_key: None,
            driving_url: "https://apis-navi.kakaomobility.com/v1/directions".to_string(),
            driving_api_key: None,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: LatLng::new(37.4488, 127.1267),
            default_zoom: 15,
            palette: ["red", "blue", "green", "orange", "purple", "yellow"]
                .iter()
                .map(|color| format!("/icons/marker-{color}.png"))
                .collect(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: default_cache_location(),
            ttl_hours: 24,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            otlp_endpoint: None,
        }
    }
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("newsmap").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".cache/newsmap".to_string())
}

impl NewsMapConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("NEWSMAP_CONFIG").map(PathBuf::from);
        Self::load_from_path(path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // NEWSMAP_YOUTUBE__API_KEY overrides youtube.api_key
        builder = builder.add_source(
            Environment::with_prefix("NEWSMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: NewsMapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("newsmap").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds == 0 || self.http.timeout_seconds > 300 {
            return Err(
                NewsMapError::config("HTTP timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.map.palette.is_empty() {
            return Err(NewsMapError::config("Marker palette needs at least one icon").into());
        }

        if self.youtube.truncated_title_chars == 0 {
            return Err(
                NewsMapError::config("Truncated title length must be greater than zero").into(),
            );
        }

        if self.cache.ttl_hours > 24 * 30 {
            return Err(NewsMapError::config("Cache TTL cannot exceed 30 days").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(NewsMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(NewsMapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("news.base_url", &self.news.base_url),
            ("weather.base_url", &self.weather.base_url),
            ("naver.geocode_url", &self.naver.geocode_url),
            ("naver.reverse_geocode_url", &self.naver.reverse_geocode_url),
            ("youtube.base_url", &self.youtube.base_url),
            ("routing.transit_url", &self.routing.transit_url),
            ("routing.driving_url", &self.routing.driving_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(NewsMapError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NewsMapConfig::default();
        assert_eq!(config.map.default_center, LatLng::new(37.4488, 127.1267));
        assert_eq!(config.map.default_zoom, 15);
        assert_eq!(config.map.palette.len(), 6);
        assert_eq!(config.youtube.truncated_title_chars, 20);
        assert_eq!(config.logging.level, "info");
        assert!(config.youtube.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = NewsMapConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_empty_palette() {
        let mut config = NewsMapConfig::default();
        config.map.palette.clear();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("palette"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = NewsMapConfig::default();
        config.news.base_url = "localhost:5000".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("news.base_url"));
    }

    #[test]
    fn test_config_validation_timeout() {
        let mut config = NewsMapConfig::default();
        config.http.timeout_seconds = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_keeps_defaults_for_missing_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[news]\nbase_url = \"http://news.internal:8080\"\n\n[map]\ndefault_zoom = 12"
        )
        .unwrap();

        let config = NewsMapConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.news.base_url, "http://news.internal:8080");
        assert_eq!(config.map.default_zoom, 12);
        assert_eq!(config.map.palette.len(), 6);
        assert_eq!(config.server.port, 5173);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = NewsMapConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("newsmap"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
