use crate::{
    Config,
    error::Result,
    model::{CurrentWeatherResponse, ForecastResponse},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of forecast and current-weather data.
///
/// Locations are given either as coordinates or as a geoname id, the opaque
/// identifier shared by the weather provider and the city search index.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastResponse>;

    async fn forecast_by_geoname_id(&self, geoname_id: &str) -> Result<ForecastResponse>;

    async fn current_by_geoname_id(&self, geoname_id: &str) -> Result<CurrentWeatherResponse>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn ForecastProvider>> {
    let ow = config.openweather()?;
    let provider = OpenWeatherProvider::new(ow)?;
    Ok(Arc::new(provider))
}
