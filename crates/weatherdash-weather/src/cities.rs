//! City listing client for the opendatasoft `worldcitiespop` dataset.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;
use weatherdash_core::CitiesConfig;

use crate::payload::{decode_cities, status_error, ApiCityRecord, CitiesPayload};
use crate::service::{CityQuery, CityService};
use crate::types::{City, WeatherError};

const DATASET: &str = "worldcitiespop";

pub struct CityClient {
    client: reqwest::Client,
    base_url: String,
}

impl CityClient {
    pub fn from_config(config: &CitiesConfig) -> Result<Self, WeatherError> {
        Self::with_timeout(&config.api_url, Duration::from_secs(config.request_timeout_secs))
    }

    #[cfg(test)]
    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// One page of cities.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, query: &CityQuery) -> Result<Vec<City>, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params(query))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%status, "City listing request failed");
            return Err(status_error(status, &body));
        }

        match decode_cities(&body)? {
            CitiesPayload::Failure(failure) => Err(failure.into()),
            CitiesPayload::Page(page) => Ok(page
                .records
                .into_iter()
                .filter_map(ApiCityRecord::into_city)
                .collect()),
        }
    }
}

fn query_params(query: &CityQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("dataset", DATASET.to_string()),
        ("facet", "city".to_string()),
        ("start", query.start.to_string()),
        ("rows", query.rows.to_string()),
    ];

    if let Some(text) = &query.text {
        params.push(("q", text.clone()));
    }
    if let Some(sort) = query.sort {
        params.push(("sort", sort.as_param().to_string()));
    }
    params.extend(query.exclude.iter().map(|city| ("exclude.city", city.clone())));

    params
}

#[async_trait]
impl CityService for CityClient {
    async fn fetch_cities(&self, query: &CityQuery) -> Result<Vec<City>, WeatherError> {
        self.list(query).await
    }
}
