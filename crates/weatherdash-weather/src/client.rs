//! weatherstack current-conditions client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;
use weatherdash_core::WeatherConfig;

use crate::normalize::same_city;
use crate::payload::{decode_weather, status_error, WeatherPayload};
use crate::service::WeatherService;
use crate::types::{Weather, WeatherError};

pub struct WeatherClient {
    client: reqwest::Client,
    access_key: String,
    base_url: String,
}

impl WeatherClient {
    /// Build a client from configuration. Fails when no access key is set.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let access_key = config
            .resolved_access_key()
            .ok_or(WeatherError::MissingAccessKey)?;

        Self::with_timeout(
            access_key,
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    #[cfg(test)]
    pub fn new_with_base_url(access_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_key: access_key.to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn with_timeout(access_key: &str, base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            access_key: access_key.to_string(),
            base_url: base_url.to_string(),
        })
    }

    /// Current weather for one city. A list answer (the API's multi-city
    /// shape) is searched for the requested name.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, city: &str) -> Result<Weather, WeatherError> {
        match self.request(city).await? {
            WeatherPayload::Failure(failure) => Err(failure.into()),
            WeatherPayload::One(record) => record.into_weather(city, Utc::now()),
            WeatherPayload::Many(records) => records
                .into_iter()
                .find(|r| same_city(&r.location.name, city))
                .ok_or_else(|| WeatherError::no_data(city))
                .and_then(|r| r.into_weather(city, Utc::now())),
        }
    }

    async fn request(&self, query: &str) -> Result<WeatherPayload, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("access_key", self.access_key.as_str()), ("query", query)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<WeatherPayload, WeatherError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            decode_weather(&body)
        } else {
            tracing::warn!(%status, "Weather request failed");
            Err(status_error(status, &body))
        }
    }
}

#[async_trait]
impl WeatherService for WeatherClient {
    async fn fetch_weather(&self, city: &str) -> Result<Weather, WeatherError> {
        self.fetch(city).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(name: &str, temperature: i64) -> serde_json::Value {
        serde_json::json!({
            "request": {"type": "City", "query": name},
            "location": {"name": name, "country": "Somewhere"},
            "current": {
                "temperature": temperature,
                "weather_icons": ["https://assets.weatherstack.com/images/icon.png"],
                "wind_speed": 7,
                "precip": 0,
                "humidity": 40
            }
        })
    }

    async fn client_for(server: &MockServer) -> WeatherClient {
        WeatherClient::new_with_base_url("test_key", &format!("{}/current", server.uri()))
    }

    #[tokio::test]
    async fn test_fetch_single_city() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("access_key", "test_key"))
            .and(query_param("query", "tokyo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record("Tokyo", 21)))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let weather = client.fetch("tokyo").await.unwrap();

        assert_eq!(weather.city_id, "tokyo");
        assert_eq!(weather.location_name, "Tokyo");
        assert_eq!(weather.fahrenheit(), 70);
    }

    #[tokio::test]
    async fn test_fetch_embedded_error_on_success_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": {"code": 615, "type": "request_failed", "info": "Your API request failed."}
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client.fetch("atlantis").await.unwrap_err();

        assert!(matches!(err, WeatherError::Api { code: Some(615), .. }));
        assert_eq!(err.to_string(), "Your API request failed.");
    }

    #[tokio::test]
    async fn test_fetch_http_error_uses_payload_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"info": "Internal trouble"}
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client.fetch("tokyo").await.unwrap_err();

        assert!(matches!(err, WeatherError::Api { code: Some(500), .. }));
        assert_eq!(err.to_string(), "Internal trouble");
    }

    #[tokio::test]
    async fn test_fetch_different_city_is_no_data() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record("Rajkot", 30)))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client.fetch("new york").await.unwrap_err();

        assert!(matches!(err, WeatherError::NoData { .. }));
    }

    #[tokio::test]
    async fn test_fetch_list_answer_picks_requested_city() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("query", "new york"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                record("Bombay", 31),
                record("New York City", 12),
            ])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let weather = client.fetch("new york").await.unwrap();

        assert_eq!(weather.city_id, "new york");
        assert_eq!(weather.location_name, "New York City");
        assert_eq!(weather.temperature, 12.0);
    }

    #[tokio::test]
    async fn test_fetch_list_answer_without_requested_city_is_no_data() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                record("Bombay", 31),
                record("Rajkot", 30),
            ])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client.fetch("atlantis").await.unwrap_err();

        assert!(matches!(err, WeatherError::NoData { .. }));
    }

    #[test]
    fn test_from_config_requires_access_key() {
        let mut config = WeatherConfig {
            access_key: None,
            ..WeatherConfig::default()
        };
        assert!(matches!(
            WeatherClient::from_config(&config),
            Err(WeatherError::MissingAccessKey)
        ));

        config.access_key = Some("  ".to_string());
        assert!(WeatherClient::from_config(&config).is_err());

        config.access_key = Some("abc".to_string());
        assert!(WeatherClient::from_config(&config).is_ok());

        config.access_key = None;
        config.env_access_key = Some("from-env".to_string());
        assert!(WeatherClient::from_config(&config).is_ok());
    }
}
