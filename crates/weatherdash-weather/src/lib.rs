//! Remote services for weatherdash
//!
//! City listing (opendatasoft), current weather (weatherstack) and reverse
//! geocoding (Nominatim) clients, plus the lookup cache and the city name
//! rules shared by everything that compares cities.

pub mod cache;
pub mod cities;
pub mod client;
pub mod geocode;
pub mod location;
pub mod lookup;
pub mod normalize;
mod payload;
pub mod service;
pub mod types;

pub use cache::{CachedWeatherService, WeatherCache, QUERIES_KEY};
pub use cities::CityClient;
pub use client::WeatherClient;
pub use geocode::ReverseGeocoder;
pub use location::{LocationPermission, LOCATION_GRANTED_KEY};
pub use lookup::lookup_each;
pub use normalize::{city_key, contains_city, same_city, uniq_by};
pub use service::{CityQuery, CityService, GeocodeService, SortOrder, WeatherService};
pub use types::*;
