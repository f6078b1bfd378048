//! Current conditions for each city in a batch of search results.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::{Error, Result},
    model::{CityInfo, SearchItem},
    provider::ForecastProvider,
};

#[async_trait]
pub trait CityInfoSource: Send + Sync {
    /// One `CityInfo` per item, in item order.
    async fn city_info_list(&self, items: &[SearchItem]) -> Result<Vec<CityInfo>>;
}

/// Looks up current weather for every item through a [`ForecastProvider`].
#[derive(Debug, Clone)]
pub struct WeatherCityInfo {
    provider: Arc<dyn ForecastProvider>,
}

impl WeatherCityInfo {
    pub fn new(provider: Arc<dyn ForecastProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CityInfoSource for WeatherCityInfo {
    async fn city_info_list(&self, items: &[SearchItem]) -> Result<Vec<CityInfo>> {
        debug!(count = items.len(), "Fetching city info");

        let lookups = items.iter().map(|item| async move {
            let current = self.provider.current_by_geoname_id(&item.geoname_id).await?;
            let mut info = CityInfo::from(current);
            // Keep the index's id so callers can pair info with items.
            info.geoname_id = item.geoname_id.clone();
            Ok::<_, Error>(info)
        });

        try_join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Service;
    use crate::model::{CurrentWeatherResponse, ForecastResponse, fixtures};

    #[derive(Debug)]
    struct FakeProvider;

    #[async_trait]
    impl ForecastProvider for FakeProvider {
        async fn forecast_by_coordinates(&self, _: f64, _: f64) -> Result<ForecastResponse> {
            unreachable!("not used by city info")
        }

        async fn forecast_by_geoname_id(&self, _: &str) -> Result<ForecastResponse> {
            unreachable!("not used by city info")
        }

        async fn current_by_geoname_id(&self, geoname_id: &str) -> Result<CurrentWeatherResponse> {
            if geoname_id == "missing" {
                return Err(Error::Status {
                    service: Service::OpenWeather,
                    status: 404,
                    body: "city not found".into(),
                });
            }
            let id: u64 = geoname_id.parse().unwrap_or(0);
            let name = format!("City {geoname_id}");
            let current = fixtures::current_json(id, &name, id as f64 / 10.0);
            Ok(serde_json::from_value(current).unwrap())
        }
    }

    fn item(geoname_id: &str) -> SearchItem {
        SearchItem {
            name: format!("City {geoname_id}"),
            country: "ES".into(),
            geoname_id: geoname_id.into(),
            coordinates: None,
            population: None,
            object_id: None,
        }
    }

    #[tokio::test]
    async fn returns_one_info_per_item_in_order() {
        let source = WeatherCityInfo::new(Arc::new(FakeProvider));
        let items = vec![item("30"), item("10"), item("20")];

        let infos = source.city_info_list(&items).await.unwrap();

        let ids: Vec<_> = infos.iter().map(|i| i.geoname_id.as_str()).collect();
        assert_eq!(ids, ["30", "10", "20"]);
        assert_eq!(infos[1].temperature, 1.0);
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch() {
        let source = WeatherCityInfo::new(Arc::new(FakeProvider));
        let items = vec![item("10"), item("missing")];

        let err = source.city_info_list(&items).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let source = WeatherCityInfo::new(Arc::new(FakeProvider));
        assert!(source.city_info_list(&[]).await.unwrap().is_empty());
    }
}
