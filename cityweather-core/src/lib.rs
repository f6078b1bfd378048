//! Core library for the `cityweather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather forecast provider
//! - The hosted city search index client
//! - Local persistence of favorites and app flags
//! - The search list coordinator tying search, city info and favorites together
//!
//! It is used by `cityweather-cli`, but can also be embedded in other front-ends.

pub mod city_info;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod prefs;
pub mod provider;
pub mod search;

pub use city_info::{CityInfoSource, WeatherCityInfo};
pub use config::{Config, OpenWeatherConfig, SearchConfig};
pub use coordinator::{SearchListCoordinator, SearchListState};
pub use error::{Error, Result};
pub use model::{CityInfo, ForecastResponse, ItemModel, SearchItem};
pub use prefs::{FavoriteSlot, PreferenceStore, Preferences};
pub use provider::{ForecastProvider, provider_from_config};
pub use search::{AlgoliaIndex, IndexSettings, SearchIndex, index_from_config};
