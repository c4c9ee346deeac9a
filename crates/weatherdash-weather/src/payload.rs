//! Wire formats of the weather and city listing services.
//!
//! Both services can answer a 2xx with an error object in place of data, so
//! every body is decoded into a tagged union first and only then converted
//! into domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::normalize::same_city;
use crate::types::{City, Weather, WeatherError};

/// `{"error": ...}` envelope shared by both services.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiFailure {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorBody {
    /// weatherstack: `{"code": 615, "type": "...", "info": "..."}`
    Detailed {
        #[serde(default)]
        code: Option<i64>,
        #[serde(alias = "message")]
        info: String,
    },
    /// opendatasoft: a bare string
    Text(String),
}

impl From<ApiFailure> for WeatherError {
    fn from(failure: ApiFailure) -> Self {
        match failure.error {
            ApiErrorBody::Detailed { code, info } => WeatherError::api(code, info),
            ApiErrorBody::Text(message) => WeatherError::api(None, message),
        }
    }
}

/// Message for a non-2xx response: the payload's own error text when there
/// is one, otherwise the status line and raw body.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> WeatherError {
    match serde_json::from_str::<ApiFailure>(body) {
        Ok(failure) => {
            let mut err = WeatherError::from(failure);
            if let WeatherError::Api { code, .. } = &mut err {
                code.get_or_insert(i64::from(status.as_u16()));
            }
            err
        }
        Err(_) if body.trim().is_empty() => {
            WeatherError::api(Some(i64::from(status.as_u16())), status.to_string())
        }
        Err(_) => WeatherError::api(
            Some(i64::from(status.as_u16())),
            format!("{}: {}", status, body.trim()),
        ),
    }
}

// ---------------------------------------------------------------------------
// weatherstack
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WeatherPayload {
    Failure(ApiFailure),
    Many(Vec<ApiWeatherRecord>),
    One(ApiWeatherRecord),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiWeatherRecord {
    pub location: ApiLocation,
    pub current: ApiCurrent,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiLocation {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCurrent {
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub precip: f64,
    #[serde(default)]
    pub humidity: u8,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub weather_icons: Vec<String>,
}

impl ApiWeatherRecord {
    /// Convert into a [`Weather`] for `requested`.
    ///
    /// The service resolves loosely and may answer for a different place;
    /// an answer whose location name is not the [`same_city`] as the request
    /// counts as no data.
    pub fn into_weather(self, requested: &str, fetched_at: DateTime<Utc>) -> Result<Weather, WeatherError> {
        let location_name = if self.location.name.trim().is_empty() {
            requested.to_string()
        } else if same_city(&self.location.name, requested) {
            self.location.name
        } else {
            tracing::debug!(
                requested,
                answered = %self.location.name,
                "Weather service answered for a different city"
            );
            return Err(WeatherError::no_data(requested));
        };

        Ok(Weather {
            city_id: requested.to_string(),
            location_name,
            temperature: self.current.temperature,
            precipitation: self.current.precip,
            humidity: self.current.humidity,
            wind_speed: self.current.wind_speed,
            icon_url: self.current.weather_icons.into_iter().next(),
            fetched_at,
        })
    }
}

pub(crate) fn decode_weather(body: &str) -> Result<WeatherPayload, WeatherError> {
    serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// opendatasoft worldcitiespop
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CitiesPayload {
    Failure(ApiFailure),
    Page(ApiRecordsPage),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRecordsPage {
    pub records: Vec<ApiCityRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCityRecord {
    #[serde(default)]
    pub fields: ApiCityFields,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiCityFields {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub accentcity: Option<String>,
}

impl ApiCityRecord {
    /// Records without a city identifier are dropped.
    pub fn into_city(self) -> Option<City> {
        let id = self.fields.city.filter(|c| !c.trim().is_empty())?;
        let display_name = self
            .fields
            .accentcity
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| id.clone());
        Some(City::new(id, display_name))
    }
}

pub(crate) fn decode_cities(body: &str) -> Result<CitiesPayload, WeatherError> {
    serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))
}
