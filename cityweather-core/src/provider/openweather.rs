use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::OpenWeatherConfig,
    error::{Error, Result, Service, truncate_body},
    model::{CurrentWeatherResponse, ForecastResponse},
};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    units: String,
    lang: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: &OpenWeatherConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: config.api_key.clone(),
            units: config.units.clone(),
            lang: config.lang.clone(),
            base_url,
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/data/2.5/{}", self.base_url, endpoint);
        debug!(%url, ?location, "OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(location)
            .query(&[
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                service: Service::OpenWeather,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        if body.trim().is_empty() {
            return Err(Error::EmptyBody { service: Service::OpenWeather });
        }

        serde_json::from_str(&body).map_err(|source| Error::Parse {
            service: Service::OpenWeather,
            source,
        })
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn forecast_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastResponse> {
        self.get_json(
            "forecast",
            &[("lat", latitude.to_string()), ("lon", longitude.to_string())],
        )
        .await
    }

    async fn forecast_by_geoname_id(&self, geoname_id: &str) -> Result<ForecastResponse> {
        self.get_json("forecast", &[("id", geoname_id.to_string())]).await
    }

    async fn current_by_geoname_id(&self, geoname_id: &str) -> Result<CurrentWeatherResponse> {
        self.get_json("weather", &[("id", geoname_id.to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        let mut cfg = OpenWeatherConfig::new("TEST_KEY");
        cfg.lang = "es".into();
        cfg.base_url = Some(format!("{}/", server.uri()));
        OpenWeatherProvider::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn forecast_by_coordinates_sends_location_and_settings() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "40.5"))
            .and(query_param("lon", "-3.25"))
            .and(query_param("appid", "TEST_KEY"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "es"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::forecast_json()))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = provider_for(&server).forecast_by_coordinates(40.5, -3.25).await.unwrap();

        assert_eq!(forecast.city.name, "Madrid");
        assert_eq!(forecast.list.len(), 3);
    }

    #[tokio::test]
    async fn forecast_by_geoname_id_uses_id_parameter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("id", "3117735"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::forecast_json()))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = provider_for(&server).forecast_by_geoname_id("3117735").await.unwrap();
        assert_eq!(forecast.city.id, 3117735);
    }

    #[tokio::test]
    async fn current_by_geoname_id_hits_weather_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("id", "2996944"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(fixtures::current_json(2996944, "Lyon", 8.0)),
            )
            .mount(&server)
            .await;

        let current = provider_for(&server).current_by_geoname_id("2996944").await.unwrap();
        assert_eq!(current.name, "Lyon");
        assert_eq!(current.main.temp, 8.0);
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = provider_for(&server).forecast_by_geoname_id("1").await.unwrap_err();
        assert!(matches!(err, Error::EmptyBody { service: Service::OpenWeather }), "{err:?}");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401,
                "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).forecast_by_coordinates(1.0, 2.0).await.unwrap_err();
        match err {
            Error::Status { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"cod\": \"200\""))
            .mount(&server)
            .await;

        let err = provider_for(&server).forecast_by_geoname_id("1").await.unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{err:?}");
    }
}
