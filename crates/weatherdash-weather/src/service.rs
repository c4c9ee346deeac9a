//! Service seams between the dashboard and the remote APIs.
//!
//! The HTTP clients implement these, and so does the weather cache; tests
//! substitute in-memory fakes.

use async_trait::async_trait;

use crate::normalize::{city_key, uniq_by};
use crate::types::{City, Coordinates, Weather, WeatherError};

/// Sort order for the city listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most populous first
    #[default]
    Population,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Population => "population",
        }
    }
}

/// A page request against the city listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CityQuery {
    pub start: usize,
    pub rows: usize,
    /// Free-text search
    pub text: Option<String>,
    pub sort: Option<SortOrder>,
    /// Cities the listing must leave out
    pub exclude: Vec<String>,
}

impl CityQuery {
    /// The most populous `rows` cities, minus `exclude`.
    pub fn popular(rows: usize, exclude: Vec<String>) -> Self {
        Self {
            start: 0,
            rows,
            text: None,
            sort: Some(SortOrder::Population),
            exclude,
        }
    }

    /// Cities matching `text`, most populous first.
    pub fn search(text: impl Into<String>, rows: usize) -> Self {
        Self {
            start: 0,
            rows,
            text: Some(text.into()),
            sort: Some(SortOrder::Population),
            exclude: Vec::new(),
        }
    }
}

#[async_trait]
pub trait CityService: Send + Sync {
    async fn fetch_cities(&self, query: &CityQuery) -> Result<Vec<City>, WeatherError>;

    /// Cities whose name matches `text`, most populous first. A city listed
    /// more than once is kept at its first position.
    async fn search_cities(&self, text: &str, rows: usize) -> Result<Vec<City>, WeatherError> {
        let cities = self.fetch_cities(&CityQuery::search(text, rows)).await?;
        Ok(uniq_by(cities, |city| city_key(&city.id)))
    }
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Current weather for one city. Fails with [`WeatherError::NoData`]
    /// when the service cannot resolve the name.
    async fn fetch_weather(&self, city: &str) -> Result<Weather, WeatherError>;
}

#[async_trait]
pub trait GeocodeService: Send + Sync {
    /// Name of the city at `coords`, or `None` when it cannot be resolved.
    async fn city_at(&self, coords: Coordinates) -> Option<String>;
}
