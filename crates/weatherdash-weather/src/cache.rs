//! Weather lookup cache.
//!
//! Records are keyed by [`city_key`] and stay fresh for a configurable
//! window; a stale record is refetched transparently. The cache can be
//! written to the `queries` storage key and read back on the next start.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use weatherdash_store::{read_json, write_json, KeyValueStore, StoreResult};

use crate::normalize::city_key;
use crate::service::WeatherService;
use crate::types::{Weather, WeatherError};

/// Storage key holding the persisted cache.
pub const QUERIES_KEY: &str = "queries";

#[derive(Debug)]
pub struct WeatherCache {
    entries: Mutex<HashMap<String, Weather>>,
    ttl: Duration,
}

impl WeatherCache {
    /// A zero `ttl` disables caching: nothing is ever fresh.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh record for `city`, if any.
    pub fn get(&self, city: &str) -> Option<Weather> {
        self.get_at(city, Utc::now())
    }

    pub fn get_at(&self, city: &str, now: DateTime<Utc>) -> Option<Weather> {
        let entries = self.entries.lock();
        entries
            .get(&city_key(city))
            .filter(|weather| self.is_fresh(weather, now))
            .cloned()
    }

    pub fn insert(&self, weather: Weather) {
        self.entries.lock().insert(city_key(&weather.city_id), weather);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every record that is no longer fresh at `now`. Returns how many
    /// were dropped.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, weather| self.is_fresh(weather, now));
        before - entries.len()
    }

    /// Write every fresh record under [`QUERIES_KEY`].
    pub fn persist(&self, store: &dyn KeyValueStore) -> StoreResult<()> {
        self.evict_stale(Utc::now());
        let entries = self.entries.lock();
        write_json(store, QUERIES_KEY, &*entries)?;
        tracing::debug!(count = entries.len(), "Persisted weather cache");
        Ok(())
    }

    /// Load records saved by [`persist`](Self::persist), keeping only fresh
    /// ones. Unreadable data is ignored. Returns the number loaded.
    pub fn hydrate(&self, store: &dyn KeyValueStore) -> usize {
        let saved: HashMap<String, Weather> = read_json(store, QUERIES_KEY);
        let now = Utc::now();

        let mut entries = self.entries.lock();
        let mut loaded = 0;
        for (key, weather) in saved {
            if self.is_fresh(&weather, now) {
                entries.insert(key, weather);
                loaded += 1;
            }
        }

        tracing::debug!(loaded, "Hydrated weather cache");
        loaded
    }

    fn is_fresh(&self, weather: &Weather, now: DateTime<Utc>) -> bool {
        match (now - weather.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            // Fetched "in the future": clock skew, treat as fresh
            Err(_) => !self.ttl.is_zero(),
        }
    }
}

/// A [`WeatherService`] that consults a [`WeatherCache`] before the wrapped
/// service and stores every successful answer.
pub struct CachedWeatherService {
    inner: Arc<dyn WeatherService>,
    cache: Arc<WeatherCache>,
}

impl CachedWeatherService {
    pub fn new(inner: Arc<dyn WeatherService>, cache: Arc<WeatherCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<WeatherCache> {
        &self.cache
    }
}

#[async_trait]
impl WeatherService for CachedWeatherService {
    async fn fetch_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        if let Some(mut weather) = self.cache.get(city) {
            tracing::trace!(city, "Weather cache hit");
            // Same place, possibly requested under another spelling
            weather.city_id = city.to_string();
            return Ok(weather);
        }

        let weather = self.inner.fetch_weather(city).await?;
        self.cache.insert(weather.clone());
        Ok(weather)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use weatherdash_store::MemoryStore;

    fn weather(city: &str, fetched_at: DateTime<Utc>) -> Weather {
        Weather {
            city_id: city.to_string(),
            location_name: city.to_string(),
            temperature: 20.0,
            precipitation: 0.0,
            humidity: 50,
            wind_speed: 5.0,
            icon_url: None,
            fetched_at,
        }
    }

    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherService for CountingService {
        async fn fetch_weather(&self, city: &str) -> Result<Weather, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if city == "atlantis" {
                return Err(WeatherError::no_data(city));
            }
            Ok(weather(city, Utc::now()))
        }
    }

    #[test]
    fn test_fresh_within_ttl() {
        let cache = WeatherCache::new(Duration::from_secs(30 * 60));
        let fetched = Utc::now();
        cache.insert(weather("tokyo", fetched));

        assert!(cache.get_at("Tokyo", fetched + chrono::Duration::minutes(29)).is_some());
        assert!(cache.get_at("tokyo", fetched + chrono::Duration::minutes(30)).is_none());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = WeatherCache::new(Duration::ZERO);
        cache.insert(weather("tokyo", Utc::now()));
        assert!(cache.get("tokyo").is_none());
    }

    #[test]
    fn test_keys_are_normalized() {
        let cache = WeatherCache::new(Duration::from_secs(60));
        cache.insert(weather("New  York", Utc::now()));

        assert!(cache.get("new york").is_some());
        cache.insert(weather("NEW YORK", Utc::now()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_stale() {
        let cache = WeatherCache::new(Duration::from_secs(60));
        let now = Utc::now();
        cache.insert(weather("tokyo", now - chrono::Duration::minutes(5)));
        cache.insert(weather("goa", now));

        assert_eq!(cache.evict_stale(now), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_persist_and_hydrate() {
        let store = MemoryStore::new();
        let cache = WeatherCache::new(Duration::from_secs(30 * 60));
        cache.insert(weather("tokyo", Utc::now()));
        cache.insert(weather("bombay", Utc::now() - chrono::Duration::hours(2)));
        cache.persist(&store).unwrap();

        let restored = WeatherCache::new(Duration::from_secs(30 * 60));
        assert_eq!(restored.hydrate(&store), 1);
        assert!(restored.get("tokyo").is_some());
        assert!(restored.get("bombay").is_none());
    }

    #[test]
    fn test_hydrate_ignores_corrupt_data() {
        let store = MemoryStore::new();
        store.set(QUERIES_KEY, "not json").unwrap();

        let cache = WeatherCache::new(Duration::from_secs(60));
        assert_eq!(cache.hydrate(&store), 0);
    }

    #[tokio::test]
    async fn test_cached_service_fetches_once() {
        let inner = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(WeatherCache::new(Duration::from_secs(60)));
        let service = CachedWeatherService::new(inner.clone(), cache);

        service.fetch_weather("tokyo").await.unwrap();
        let again = service.fetch_weather("TOKYO").await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(again.city_id, "TOKYO");
    }

    #[tokio::test]
    async fn test_cached_service_does_not_cache_failures() {
        let inner = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(WeatherCache::new(Duration::from_secs(60)));
        let service = CachedWeatherService::new(inner.clone(), cache);

        assert!(service.fetch_weather("atlantis").await.is_err());
        assert!(service.fetch_weather("atlantis").await.is_err());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_cached_service_refetches_stale_record() {
        let inner = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(WeatherCache::new(Duration::from_secs(60)));
        let fetched = Utc::now() - chrono::Duration::minutes(5);
        cache.insert(weather("tokyo", fetched));
        let service = CachedWeatherService::new(inner.clone(), Arc::clone(&cache));

        let refreshed = service.fetch_weather("tokyo").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert!(refreshed.fetched_at > fetched);

        // The refetched record is fresh again
        service.fetch_weather("tokyo").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
