//! Dashboard orchestration.
//!
//! Ties the local stores, the remote services and the board together and
//! exposes the user actions: refresh, fetch new cities, remove, restore,
//! favorite, notes, city detail, search and local weather.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::instrument;
use weatherdash_core::{AppError, Config, StorageError};
use weatherdash_store::{CityLifecycleStore, KeyValueStore, UserPreferenceRecord, UserPreferenceStore};
use weatherdash_weather::{
    city_key, contains_city, lookup_each, CachedWeatherService, City, CityClient, CityService, Coordinates, GeocodeService, LocationPermission, ReverseGeocoder, Weather, WeatherCache,
    WeatherClient, WeatherService,
};

use crate::board::{Board, BoardView};
use crate::notify::{Notifier, Severity, TracingNotifier};
use crate::reconcile::{candidate_query, reconcile, CitySelection};

pub const CITY_REMOVED: &str = "City removed!";
pub const CITY_RESTORED: &str = "City restored!";
pub const NOTES_SAVED: &str = "Notes saved!";
pub const NOTES_DELETED: &str = "Notes deleted!";
pub const MARKED_FAVORITE: &str = "Marked as favorite!";
pub const UNMARKED_FAVORITE: &str = "Removed from favorites!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Candidate cities requested per cycle
    pub page_size: usize,
    /// Rows requested by a name search
    pub search_rows: usize,
    /// How long notifications stay up
    pub notify_duration: Duration,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            page_size: 2,
            search_rows: 10,
            notify_duration: Duration::from_millis(5000),
        }
    }
}

impl DashboardOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.cities.page_size as usize,
            search_rows: config.cities.search_rows as usize,
            notify_duration: Duration::from_millis(config.notifications.duration_ms),
        }
    }
}

/// Weather for one city together with what the user recorded about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDetail {
    pub city_id: String,
    pub weather: Weather,
    pub is_favorite: bool,
    pub notes: String,
}

pub struct Dashboard {
    store: Arc<dyn KeyValueStore>,
    preferences: UserPreferenceStore,
    lifecycle: CityLifecycleStore,
    location: LocationPermission,
    cities: Arc<dyn CityService>,
    weather: Arc<dyn WeatherService>,
    geocoder: Option<Arc<dyn GeocodeService>>,
    cache: Option<Arc<WeatherCache>>,
    notifier: Arc<dyn Notifier>,
    board: Board,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        cities: Arc<dyn CityService>,
        weather: Arc<dyn WeatherService>,
        options: DashboardOptions,
    ) -> Self {
        Self {
            preferences: UserPreferenceStore::new(Arc::clone(&store)),
            lifecycle: CityLifecycleStore::new(Arc::clone(&store)),
            location: LocationPermission::new(Arc::clone(&store)),
            store,
            cities,
            weather,
            geocoder: None,
            cache: None,
            notifier: Arc::new(TracingNotifier),
            board: Board::new(),
            options,
        }
    }

    /// Build a dashboard talking to the configured remote services, with a
    /// weather cache hydrated from `store`.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let cities = Arc::new(CityClient::from_config(&config.cities)?);
        let weather = Arc::new(WeatherClient::from_config(&config.weather)?);
        let cache = Arc::new(WeatherCache::new(config.weather.cache_ttl()));

        let mut dashboard = Self::new(store, cities, weather, DashboardOptions::from_config(config))
            .with_cache(cache);

        if config.geocoding.enabled {
            dashboard = dashboard.with_geocoder(Arc::new(ReverseGeocoder::from_config(&config.geocoding)?));
        }

        Ok(dashboard)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn GeocodeService>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Route weather lookups through `cache`, loading what was persisted
    /// from the previous run.
    pub fn with_cache(mut self, cache: Arc<WeatherCache>) -> Self {
        cache.hydrate(self.store.as_ref());
        self.weather = Arc::new(CachedWeatherService::new(
            Arc::clone(&self.weather),
            Arc::clone(&cache),
        ));
        self.cache = Some(cache);
        self
    }

    /// Current local state as reconciliation sees it.
    pub fn selection(&self) -> CitySelection {
        CitySelection {
            favorites: self.preferences.favorite_ids(),
            removed: self.lifecycle.removed(),
            restored: self.lifecycle.restored(),
            excluded: self.lifecycle.excluded(),
        }
    }

    pub fn view(&self) -> BoardView {
        self.board.snapshot(&self.preferences.favorite_ids())
    }

    /// Fetch a candidate page, reconcile it with local state and load
    /// weather for every resulting city.
    ///
    /// A failed candidate fetch is reported on the board; restored and
    /// favorite cities are still shown. Local state is read again once the
    /// page arrives, so a city removed meanwhile stays off the board.
    #[instrument(skip(self), level = "info")]
    pub async fn refresh(&self) -> BoardView {
        let query = candidate_query(self.options.page_size, &self.selection());

        let (candidates, city_error) = match self.cities.fetch_cities(&query).await {
            Ok(candidates) => (candidates, None),
            Err(e) => {
                tracing::warn!("Failed to fetch candidate cities: {}", e);
                let message = e.to_string();
                self.notify(AppError::from(e).user_message(), Severity::Warning);
                (Vec::new(), Some(message))
            }
        };

        let sequence = reconcile(&candidates, &self.selection());
        let cycle = self.board.begin_cycle(sequence);
        if let Some(message) = city_error {
            self.board.set_city_error(message);
        }

        // A removal racing with the reconcile above lands in the store
        // before it reaches the board
        for city in self.board.wanted() {
            if self.lifecycle.is_removed(&city_key(&city)) {
                self.board.unwant(&city);
            }
        }

        self.load_weather(&self.board.wanted()).await;

        let view = self.view();
        tracing::info!(
            cycle,
            rows = view.rows.len(),
            failures = view.failures.len(),
            "Dashboard refreshed"
        );
        view
    }

    /// Freeze the removed list as the exclusion filter and refresh.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_new_cities(&self) -> Result<BoardView, AppError> {
        let excluded = self.stored(self.lifecycle.commit_exclusions())?;
        tracing::debug!(excluded = excluded.len(), "Fetching new cities");
        Ok(self.refresh().await)
    }

    /// Dismiss a city. When only favorites remain afterwards, a new page of
    /// cities is fetched.
    #[instrument(skip(self), level = "info")]
    pub async fn remove_city(&self, city_id: &str) -> Result<BoardView, AppError> {
        let key = city_key(city_id);
        self.stored(self.lifecycle.remove(&key))?;
        self.board.unwant(&key);
        self.notify(CITY_REMOVED, Severity::Success);

        let favorites = self.preferences.favorite_ids();
        let only_favorites_left = self
            .board
            .wanted()
            .iter()
            .all(|city| contains_city(&favorites, city));

        if only_favorites_left {
            tracing::info!("No regular cities left, fetching new ones");
            return self.fetch_new_cities().await;
        }

        Ok(self.view())
    }

    /// Bring a removed city back and load its weather.
    #[instrument(skip(self), level = "info")]
    pub async fn restore_city(&self, city_id: &str) -> Result<BoardView, AppError> {
        let key = city_key(city_id);
        self.stored(self.lifecycle.restore(&key))?;
        self.notify(CITY_RESTORED, Severity::Success);

        self.board.want(&key);
        self.load_weather(&[key]).await;
        Ok(self.view())
    }

    /// Flip the favorite flag, keeping the notes.
    #[instrument(skip(self), level = "info")]
    pub fn toggle_favorite(&self, city_id: &str) -> Result<UserPreferenceRecord, AppError> {
        let key = city_key(city_id);
        let is_favorite = !self.preferences.get(&key).is_some_and(|r| r.is_favorite);
        let record = self.stored(self.preferences.set_favorite(&key, is_favorite))?;

        let message = if is_favorite {
            MARKED_FAVORITE
        } else {
            UNMARKED_FAVORITE
        };
        self.notify(message, Severity::Success);
        Ok(record)
    }

    /// Replace the notes, keeping the favorite flag.
    #[instrument(skip(self, notes), level = "info")]
    pub fn save_notes(&self, city_id: &str, notes: &str) -> Result<UserPreferenceRecord, AppError> {
        let record = self.stored(self.preferences.save_notes(&city_key(city_id), notes))?;
        self.notify(NOTES_SAVED, Severity::Success);
        Ok(record)
    }

    /// Clear the notes, keeping the favorite flag.
    #[instrument(skip(self), level = "info")]
    pub fn delete_notes(&self, city_id: &str) -> Result<UserPreferenceRecord, AppError> {
        let record = self.stored(self.preferences.delete_notes(&city_key(city_id)))?;
        self.notify(NOTES_DELETED, Severity::Success);
        Ok(record)
    }

    /// Weather and the user's record for a single city.
    #[instrument(skip(self), level = "info")]
    pub async fn city_detail(&self, city_id: &str) -> Result<CityDetail, AppError> {
        let key = city_key(city_id);
        let weather = self.weather.fetch_weather(&key).await?;
        let record = self.preferences.get(&key);

        Ok(CityDetail {
            is_favorite: record.as_ref().is_some_and(|r| r.is_favorite),
            notes: record.map(|r| r.notes).unwrap_or_default(),
            city_id: key,
            weather,
        })
    }

    /// Cities matching `text`, without repeats. Blank text matches nothing.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, text: &str) -> Result<Vec<City>, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.cities.search_cities(text, self.options.search_rows).await?)
    }

    /// Weather where the user is. `None` when location access is not
    /// granted, no geocoder is configured, or the position has no city.
    #[instrument(skip(self), level = "info")]
    pub async fn local_weather(&self, coords: Coordinates) -> Result<Option<CityDetail>, AppError> {
        if !self.location.is_granted() {
            tracing::debug!("Location access not granted");
            return Ok(None);
        }
        let Some(geocoder) = &self.geocoder else {
            return Ok(None);
        };
        let Some(city) = geocoder.city_at(coords).await else {
            return Ok(None);
        };

        self.city_detail(&city).await.map(Some)
    }

    pub fn is_location_granted(&self) -> bool {
        self.location.is_granted()
    }

    pub fn set_location_granted(&self, granted: bool) -> Result<(), AppError> {
        self.stored(self.location.set_granted(granted))
    }

    pub fn removed_cities(&self) -> Vec<String> {
        self.lifecycle.removed()
    }

    pub fn restored_cities(&self) -> Vec<String> {
        self.lifecycle.restored()
    }

    /// Save fresh cached weather so the next run can start from it.
    pub fn persist_cache(&self) -> Result<(), AppError> {
        match &self.cache {
            Some(cache) => Ok(cache.persist(self.store.as_ref())?),
            None => Ok(()),
        }
    }

    async fn load_weather(&self, cities: &[String]) {
        lookup_each(Arc::clone(&self.weather), cities, |city, outcome| {
            self.board.accept(&city, outcome);
        })
        .await;
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifier
            .notify(message, severity, self.options.notify_duration);
    }

    /// Surface a failed store write to the user and convert it.
    fn stored<T>(&self, result: Result<T, StorageError>) -> Result<T, AppError> {
        result.map_err(|e| {
            tracing::error!("Store write failed: {}", e);
            let err = AppError::from(e);
            self.notify(err.user_message(), Severity::Error);
            err
        })
    }
}
