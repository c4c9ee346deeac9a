use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable that overrides `weather.access_key`.
pub const ACCESS_KEY_ENV: &str = "WEATHERSTACK_ACCESS_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the local preference database
    pub data_dir: PathBuf,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Popular-city listing settings
    #[serde(default)]
    pub cities: CitiesConfig,

    /// Reverse geocoding for the "my location" lookup
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Notification defaults
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Current-conditions endpoint
    #[serde(default = "default_weather_api_url")]
    pub api_url: String,

    /// API access key as written in the config file
    #[serde(default)]
    pub access_key: Option<String>,

    /// Key taken from WEATHERSTACK_ACCESS_KEY; never written back to disk
    #[serde(skip)]
    pub env_access_key: Option<String>,

    /// How long a fetched weather record stays fresh
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_weather_api_url() -> String {
    "http://api.weatherstack.com/current".to_string()
}

fn default_cache_ttl_minutes() -> u32 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_weather_api_url(),
            access_key: None,
            env_access_key: None,
            cache_ttl_minutes: default_cache_ttl_minutes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WeatherConfig {
    /// The key requests should use: the environment wins over the file.
    /// Blank keys count as missing.
    pub fn resolved_access_key(&self) -> Option<&str> {
        self.env_access_key
            .as_deref()
            .or(self.access_key.as_deref())
            .filter(|key| !key.trim().is_empty())
    }

    /// Cache freshness window.
    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.cache_ttl_minutes) * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitiesConfig {
    /// City search endpoint (worldcitiespop dataset)
    #[serde(default = "default_cities_api_url")]
    pub api_url: String,

    /// Popular cities requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Rows returned by a name search
    #[serde(default = "default_search_rows")]
    pub search_rows: u32,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_cities_api_url() -> String {
    "https://public.opendatasoft.com/api/records/1.0/search/".to_string()
}

fn default_page_size() -> u32 {
    2
}

fn default_search_rows() -> u32 {
    10
}

impl Default for CitiesConfig {
    fn default() -> Self {
        Self {
            api_url: default_cities_api_url(),
            page_size: default_page_size(),
            search_rows: default_search_rows(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Reverse geocoding endpoint (Nominatim)
    #[serde(default = "default_geocoding_api_url")]
    pub api_url: String,

    /// Whether "my location" lookups are attempted at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_geocoding_api_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_url: default_geocoding_api_url(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// How long a notification stays visible, in milliseconds
    #[serde(default = "default_notification_ms")]
    pub duration_ms: u64,
}

fn default_notification_ms() -> u64 {
    5000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_notification_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("weatherdash");

        Self {
            data_dir,
            weather: WeatherConfig::default(),
            cities: CitiesConfig::default(),
            geocoding: GeocodingConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file if absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        Self::load_with_env_key(config_path, std::env::var(ACCESS_KEY_ENV).ok())
    }

    fn load_with_env_key(config_path: &Path, env_key: Option<String>) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadFailed(format!("{}: {}", config_path.display(), e)))?;
            toml::from_str::<Config>(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            config
        };

        config.weather.env_access_key = env_key.filter(|key| !key.trim().is_empty());
        Ok(config)
    }

    /// Load configuration (from `config_path`, or the default location) and
    /// validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url(&self.weather.api_url, "weather.api_url", &mut result);
        Self::validate_url(&self.cities.api_url, "cities.api_url", &mut result);
        if self.geocoding.enabled {
            Self::validate_url(&self.geocoding.api_url, "geocoding.api_url", &mut result);
        }

        if self.weather.resolved_access_key().is_none() {
            result.add_warning(
                "weather.access_key",
                format!("No access key configured (set {})", ACCESS_KEY_ENV),
            );
        }

        if self.weather.cache_ttl_minutes == 0 {
            result.add_warning(
                "weather.cache_ttl_minutes",
                "Weather caching disabled (0 minutes)",
            );
        } else if self.weather.cache_ttl_minutes > 1440 {
            result.add_warning(
                "weather.cache_ttl_minutes",
                "Weather cache window is more than 24 hours",
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error("weather.request_timeout_secs", "Timeout must be greater than 0");
        }
        if self.cities.request_timeout_secs == 0 {
            result.add_error("cities.request_timeout_secs", "Timeout must be greater than 0");
        }

        if self.cities.page_size == 0 {
            result.add_error("cities.page_size", "Page size must be greater than 0");
        } else if self.cities.page_size > 100 {
            result.add_warning("cities.page_size", "Page size is unusually large (>100)");
        }

        if self.cities.search_rows == 0 {
            result.add_error("cities.search_rows", "Search rows must be greater than 0");
        }

        if self.data_dir.exists() && !self.data_dir.is_dir() {
            result.add_error(
                "data_dir",
                format!("Path is not a directory: {}", self.data_dir.display()),
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let write_failed =
            |reason: String| ConfigError::WriteFailed(format!("{}: {}", config_path.display(), reason));

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| write_failed(e.to_string()))?;
        std::fs::write(config_path, contents).map_err(|e| write_failed(e.to_string()))?;

        Ok(())
    }

    /// Path of the SQLite file backing the preference store
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("weatherdash.db")
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::ReadFailed("No configuration directory on this platform".into()))?
            .join("weatherdash");

        Ok(config_dir.join("config.toml"))
    }
}
