//! Reverse geocoding: turn the user's coordinates into a city name that the
//! weather service can look up.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use weatherdash_core::GeocodingConfig;

use crate::service::GeocodeService;
use crate::types::{Coordinates, WeatherError};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("weatherdash/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state_district: Option<String>,
    county: Option<String>,
}

impl NominatimAddress {
    /// Prefer city > town > village > municipality for the place name.
    fn place(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.state_district)
            .or(self.county)
            .filter(|place| !place.trim().is_empty())
    }
}

pub struct ReverseGeocoder {
    client: Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(NOMINATIM_URL)
    }

    pub fn from_config(config: &GeocodingConfig) -> Result<Self, WeatherError> {
        Self::with_base_url(&config.api_url)
    }

    fn with_base_url(base_url: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Name of the city at `coords`.
    /// Returns `None` on failure or timeout; the caller falls back to the
    /// regular city list.
    pub async fn city_at(&self, coords: Coordinates) -> Option<String> {
        let latitude = coords.latitude.to_string();
        let longitude = coords.longitude.to_string();

        let response = match self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.as_str()),
                ("lon", longitude.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("zoom", "10"),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: NominatimResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let place = body.address?.place()?;
        tracing::info!("Reverse geocoded to: {}", place);
        Some(place)
    }
}

#[async_trait]
impl GeocodeService for ReverseGeocoder {
    async fn city_at(&self, coords: Coordinates) -> Option<String> {
        ReverseGeocoder::city_at(self, coords).await
    }
}
