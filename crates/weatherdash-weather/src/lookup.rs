//! Concurrent weather lookups.
//!
//! One task per city. A failed or panicked lookup never affects the others;
//! every requested city gets exactly one outcome.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::service::WeatherService;
use crate::types::{Weather, WeatherError};

/// Look up every city concurrently, calling `on_result` as each lookup
/// finishes (in completion order).
pub async fn lookup_each<F>(service: Arc<dyn WeatherService>, cities: &[String], mut on_result: F)
where
    F: FnMut(String, Result<Weather, WeatherError>),
{
    let mut tasks = JoinSet::new();
    for city in cities {
        let service = Arc::clone(&service);
        let city = city.clone();
        tasks.spawn(async move {
            let outcome = service.fetch_weather(&city).await;
            (city, outcome)
        });
    }

    let mut pending: Vec<&String> = cities.iter().collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((city, outcome)) => {
                if let Err(e) = &outcome {
                    tracing::debug!(city = %city, "Weather lookup failed: {}", e);
                }
                if let Some(index) = pending.iter().position(|c| **c == city) {
                    pending.swap_remove(index);
                }
                on_result(city, outcome);
            }
            Err(e) => tracing::error!("Weather lookup task failed: {}", e),
        }
    }

    for city in pending {
        on_result(city.clone(), Err(WeatherError::Interrupted(city.clone())));
    }
}
