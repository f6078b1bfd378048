//! City search flow and favorites persistence behind an observable state.

use std::{future::Future, sync::Arc};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    Config,
    city_info::{CityInfoSource, WeatherCityInfo},
    error::Result,
    model::{ItemModel, SearchItem},
    prefs::{FavoriteSlot, PreferenceStore},
    provider::provider_from_config,
    search::{IndexSettings, SearchIndex, SearchQuery, index_from_config},
};

/// What the search list should currently show.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchListState {
    Loading,
    Success(ItemModel),
    NotFound,
}

pub struct SearchListCoordinator {
    state: watch::Sender<SearchListState>,
    index: Arc<dyn SearchIndex>,
    city_info: Arc<dyn CityInfoSource>,
    store: PreferenceStore,
}

impl SearchListCoordinator {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        city_info: Arc<dyn CityInfoSource>,
        store: PreferenceStore,
    ) -> Self {
        let (state, _) = watch::channel(SearchListState::NotFound);
        Self {
            state,
            index,
            city_info,
            store,
        }
    }

    /// Wire the OpenWeather provider, the search index and the preference file from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let index = index_from_config(config)?;
        let store = PreferenceStore::from_config(config)?;

        Ok(Self::new(index, Arc::new(WeatherCityInfo::new(provider)), store))
    }

    pub fn state(&self) -> SearchListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchListState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn set_loading(&self) {
        self.state.send_replace(SearchListState::Loading);
    }

    pub fn set_not_found(&self) {
        self.state.send_replace(SearchListState::NotFound);
    }

    /// Push the ranking settings to the index without waiting for the result.
    pub fn init_search_settings(&self) -> JoinHandle<()> {
        let index = Arc::clone(&self.index);

        tokio::spawn(async move {
            if let Err(e) = index.set_settings(&IndexSettings::default()).await {
                warn!(error = %e, "Failed to update search index settings");
            }
        })
    }

    /// Run a search and publish the outcome.
    ///
    /// A failure from the index or the city-info lookup is returned as-is and
    /// leaves the state at `Loading`.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<()> {
        self.set_loading();

        let response = self.index.search(&SearchQuery::new(query)).await?;

        if response.nb_hits == 0 {
            info!("No cities matched");
            self.set_not_found();
            return Ok(());
        }

        let items: Vec<SearchItem> = response.decode_hits()?;
        let city_infos = self.city_info.city_info_list(&items).await?;

        let model = ItemModel { items, city_infos };
        info!(nb_hits = response.nb_hits, returned = model.len(), "Search finished");
        self.state.send_replace(SearchListState::Success(model));
        Ok(())
    }

    pub fn save_first_save_name(&self, name: impl Into<String>) -> JoinHandle<()> {
        self.save_name(FavoriteSlot::First, name.into())
    }

    pub fn save_second_save_name(&self, name: impl Into<String>) -> JoinHandle<()> {
        self.save_name(FavoriteSlot::Second, name.into())
    }

    pub fn save_third_save_name(&self, name: impl Into<String>) -> JoinHandle<()> {
        self.save_name(FavoriteSlot::Third, name.into())
    }

    pub fn save_name(&self, slot: FavoriteSlot, name: String) -> JoinHandle<()> {
        let store = self.store.clone();
        spawn_write("favorite name", async move { store.write_save_name(slot, name).await })
    }

    pub fn save_last_geoname_id(&self, geoname_id: impl Into<String>) -> JoinHandle<()> {
        let store = self.store.clone();
        let geoname_id = geoname_id.into();
        spawn_write("last geoname id", async move {
            store.write_last_geoname_id(geoname_id).await
        })
    }

    pub fn save_geoname_id(
        &self,
        key: impl Into<String>,
        geoname_id: impl Into<String>,
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        let (key, geoname_id) = (key.into(), geoname_id.into());
        spawn_write("geoname id", async move { store.write_geoname_id(key, geoname_id).await })
    }

    pub fn save_last_saved_is_coordinated(&self, value: bool) -> JoinHandle<()> {
        let store = self.store.clone();
        spawn_write("coordinates flag", async move {
            store.write_last_saved_is_coordinated(value).await
        })
    }

    pub fn save_is_first_app_start(&self, value: bool) -> JoinHandle<()> {
        let store = self.store.clone();
        spawn_write("first start flag", async move {
            store.write_is_first_app_start(value).await
        })
    }
}

/// Launch a preference write; failures are only logged.
fn spawn_write<F>(what: &'static str, write: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = write.await {
            warn!(error = %e, "Failed to save {what}");
        }
    })
}
