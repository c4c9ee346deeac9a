//! Display board state.
//!
//! The board knows which cities the current cycle wants and collects weather
//! lookups for them as they complete, in any order. A result for a city that
//! is no longer wanted (removed, or dropped by a newer cycle) is ignored.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use weatherdash_weather::{city_key, contains_city, Weather, WeatherError};

use crate::display::DisplayRow;
use crate::reconcile::sort_rows;

/// A city whose weather lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub city_id: String,
    pub message: String,
}

/// Point-in-time copy of the board.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    /// Loaded rows, favorites first then by name
    pub rows: Vec<DisplayRow>,
    pub failures: Vec<FetchFailure>,
    /// Wanted cities with no result yet
    pub loading: Vec<String>,
    /// Set when the candidate city page could not be fetched
    pub city_error: Option<String>,
    pub cycle: u64,
}

impl BoardView {
    pub fn is_loading(&self) -> bool {
        !self.loading.is_empty()
    }
}

#[derive(Debug, Default)]
struct BoardState {
    cycle: u64,
    wanted: Vec<String>,
    weather: HashMap<String, Weather>,
    failures: HashMap<String, String>,
    city_error: Option<String>,
}

impl BoardState {
    fn is_wanted(&self, city_id: &str) -> bool {
        self.wanted.iter().any(|c| city_key(c) == city_key(city_id))
    }

    fn forget_unwanted(&mut self) {
        let wanted: Vec<String> = self.wanted.iter().map(|c| city_key(c)).collect();
        self.weather.retain(|key, _| wanted.contains(key));
        self.failures.retain(|key, _| wanted.contains(key));
    }
}

#[derive(Debug, Default)]
pub struct Board {
    state: Mutex<BoardState>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cycle wanting exactly `wanted`. Results already held for
    /// cities that stay wanted are kept. Returns the new cycle number.
    pub fn begin_cycle(&self, wanted: Vec<String>) -> u64 {
        let mut state = self.state.lock();
        state.cycle += 1;
        state.wanted = wanted;
        state.city_error = None;
        state.forget_unwanted();
        tracing::debug!(cycle = state.cycle, wanted = state.wanted.len(), "Board cycle started");
        state.cycle
    }

    /// Add a city to the current cycle.
    pub fn want(&self, city_id: &str) {
        let mut state = self.state.lock();
        if !state.is_wanted(city_id) {
            state.wanted.push(city_id.to_string());
        }
    }

    /// Drop a city from the current cycle, with anything known about it.
    pub fn unwant(&self, city_id: &str) {
        let mut state = self.state.lock();
        let key = city_key(city_id);
        state.wanted.retain(|c| city_key(c) != key);
        state.forget_unwanted();
    }

    pub fn wanted(&self) -> Vec<String> {
        self.state.lock().wanted.clone()
    }

    pub fn set_city_error(&self, message: impl Into<String>) {
        self.state.lock().city_error = Some(message.into());
    }

    /// Merge one lookup result. Returns false when the city is no longer
    /// wanted and the result was dropped.
    pub fn accept(&self, city_id: &str, outcome: Result<Weather, WeatherError>) -> bool {
        let mut state = self.state.lock();
        if !state.is_wanted(city_id) {
            tracing::debug!(city = city_id, "Dropping result for a city no longer shown");
            return false;
        }

        let key = city_key(city_id);
        match outcome {
            Ok(weather) => {
                state.failures.remove(&key);
                state.weather.insert(key, weather);
            }
            Err(e) => {
                state.weather.remove(&key);
                state.failures.insert(key, e.to_string());
            }
        }
        true
    }

    /// Current rows, failures and pending cities. `favorites` decides which
    /// rows are marked and sorted first.
    pub fn snapshot(&self, favorites: &[String]) -> BoardView {
        let state = self.state.lock();

        let mut rows = Vec::new();
        let mut failures = Vec::new();
        let mut loading = Vec::new();

        for city_id in &state.wanted {
            let key = city_key(city_id);
            if let Some(weather) = state.weather.get(&key) {
                rows.push(DisplayRow::new(
                    city_id.clone(),
                    weather.clone(),
                    contains_city(favorites, city_id),
                ));
            } else if let Some(message) = state.failures.get(&key) {
                failures.push(FetchFailure {
                    city_id: city_id.clone(),
                    message: message.clone(),
                });
            } else {
                loading.push(city_id.clone());
            }
        }

        sort_rows(&mut rows);

        BoardView {
            rows,
            failures,
            loading,
            city_error: state.city_error.clone(),
            cycle: state.cycle,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::Utc;

    fn weather(city: &str) -> Weather {
        Weather {
            city_id: city.to_string(),
            location_name: city.to_string(),
            temperature: 15.0,
            precipitation: 0.0,
            humidity: 70,
            wind_speed: 4.0,
            icon_url: None,
            fetched_at: Utc::now(),
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partial_results() {
        let board = Board::new();
        board.begin_cycle(ids(&["tokyo", "atlantis", "goa"]));

        board.accept("tokyo", Ok(weather("tokyo")));
        board.accept(
            "atlantis",
            Err(WeatherError::NoData {
                requested: "atlantis".into(),
            }),
        );

        let view = board.snapshot(&[]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].city_id, "tokyo");
        assert_eq!(view.failures.len(), 1);
        assert_eq!(view.failures[0].city_id, "atlantis");
        assert_eq!(view.loading, ids(&["goa"]));
        assert!(view.is_loading());
    }

    #[test]
    fn test_result_for_unwanted_city_is_dropped() {
        let board = Board::new();
        board.begin_cycle(ids(&["tokyo", "goa"]));
        board.unwant("goa");

        assert!(!board.accept("goa", Ok(weather("goa"))));
        let view = board.snapshot(&[]);
        assert!(view.rows.is_empty());
        assert_eq!(view.loading, ids(&["tokyo"]));
    }

    #[test]
    fn test_new_cycle_drops_stale_results() {
        let board = Board::new();
        board.begin_cycle(ids(&["tokyo", "goa"]));
        board.accept("tokyo", Ok(weather("tokyo")));
        board.accept("goa", Ok(weather("goa")));

        let cycle = board.begin_cycle(ids(&["goa", "bombay"]));
        assert_eq!(cycle, 2);

        // A slow lookup from the first cycle
        assert!(!board.accept("tokyo", Ok(weather("tokyo"))));

        let view = board.snapshot(&[]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].city_id, "goa");
        assert_eq!(view.loading, ids(&["bombay"]));
    }

    #[test]
    fn test_completion_order_does_not_matter() {
        let forward = Board::new();
        forward.begin_cycle(ids(&["tokyo", "goa", "ajmer"]));
        for city in ["tokyo", "goa", "ajmer"] {
            forward.accept(city, Ok(weather(city)));
        }

        let backward = Board::new();
        backward.begin_cycle(ids(&["tokyo", "goa", "ajmer"]));
        for city in ["ajmer", "goa", "tokyo"] {
            backward.accept(city, Ok(weather(city)));
        }

        let favorites = ids(&["goa"]);
        assert_eq!(forward.snapshot(&favorites).rows, backward.snapshot(&favorites).rows);
    }

    #[test]
    fn test_retry_success_clears_failure() {
        let board = Board::new();
        board.begin_cycle(ids(&["tokyo"]));
        board.accept("tokyo", Err(WeatherError::Parse("bad".into())));
        board.accept("tokyo", Ok(weather("tokyo")));

        let view = board.snapshot(&[]);
        assert!(view.failures.is_empty());
        assert_eq!(view.rows.len(), 1);
    }

    #[test]
    fn test_favorites_sorted_first() {
        let board = Board::new();
        board.begin_cycle(ids(&["ajmer", "bombay", "goa"]));
        for city in ["ajmer", "bombay", "goa"] {
            board.accept(city, Ok(weather(city)));
        }

        let view = board.snapshot(&ids(&["bombay", "goa"]));
        let order: Vec<_> = view.rows.iter().map(|r| r.city_id.as_str()).collect();
        assert_eq!(order, vec!["bombay", "goa", "ajmer"]);
        assert!(view.rows[0].is_favorite);
        assert!(!view.rows[2].is_favorite);
    }

    #[test]
    fn test_city_error_cleared_by_new_cycle() {
        let board = Board::new();
        board.set_city_error("Too many requests");
        assert_eq!(board.snapshot(&[]).city_error.as_deref(), Some("Too many requests"));

        board.begin_cycle(Vec::new());
        assert!(board.snapshot(&[]).city_error.is_none());
    }

    #[test]
    fn test_want_is_idempotent() {
        let board = Board::new();
        board.begin_cycle(ids(&["tokyo"]));
        board.want("Tokyo");
        board.want("goa");
        assert_eq!(board.wanted(), ids(&["tokyo", "goa"]));
    }

    #[test]
    fn test_view_json_shape() {
        let board = Board::new();
        board.begin_cycle(ids(&["goa"]));
        board.accept("goa", Ok(weather("goa")));

        let json = serde_json::to_value(board.snapshot(&[])).unwrap();
        assert_eq!(json["rows"][0]["cityId"], "goa");
        assert_eq!(json["rows"][0]["isFavorite"], false);
        assert_eq!(json["rows"][0]["weather"]["humidity"], 70);
        assert!(json["cityError"].is_null());
    }
}
