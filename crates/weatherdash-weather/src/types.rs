use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weatherdash_core::error::{AppError, NetworkError, ReqwestErrorExt};

/// A city offered by the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    /// Identifier used for lookups and local storage (lower case in the dataset)
    pub id: String,
    /// Accented, human-facing name
    pub display_name: String,
}

impl City {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Current conditions for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    /// The identifier this record was requested for
    pub city_id: String,
    /// Canonical name the weather service answered with
    pub location_name: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Millimetres
    pub precipitation: f64,
    /// Percent
    pub humidity: u8,
    /// km/h
    pub wind_speed: f64,
    pub icon_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Weather {
    /// Temperature in whole degrees Fahrenheit.
    pub fn fahrenheit(&self) -> i64 {
        (self.temperature * 9.0 / 5.0).round() as i64 + 32
    }
}

/// Geographic position used for the "my location" lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Errors from the city listing, weather and geocoding services.
///
/// A 2xx response carrying an `error` object and a non-2xx status both end
/// up as [`WeatherError::Api`], with the message taken from the payload.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Api { code: Option<i64>, message: String },

    #[error("No weather data for {requested}")]
    NoData { requested: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing weather API access key")]
    MissingAccessKey,

    #[error("Lookup for {0} did not complete")]
    Interrupted(String),
}

impl WeatherError {
    pub(crate) fn api(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn no_data(requested: impl Into<String>) -> Self {
        Self::NoData {
            requested: requested.into(),
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        use weatherdash_core::error::WeatherError as CoreWeatherError;

        match e {
            WeatherError::Network(err) => AppError::Network(err.into_network_error()),
            // weatherstack: 101 missing/invalid key
            WeatherError::Api {
                code: Some(101), ..
            }
            | WeatherError::MissingAccessKey => AppError::Weather(CoreWeatherError::InvalidApiKey),
            WeatherError::Api { message, .. } => {
                AppError::Weather(CoreWeatherError::ApiError(message))
            }
            WeatherError::NoData { requested } => {
                AppError::Weather(CoreWeatherError::CityNotFound(requested))
            }
            WeatherError::Parse(message) => {
                AppError::Network(NetworkError::InvalidResponse(message))
            }
            WeatherError::Interrupted(_) => AppError::Weather(CoreWeatherError::ServiceUnavailable),
        }
    }
}
