//! Hosted city search index.
//!
//! The index stores one record per city with at least `name`, `country` and
//! `geonameid`. Only the query and settings calls are implemented.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    Config,
    config::SearchConfig,
    error::{Error, Result, Service, truncate_body},
};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Ranking and pagination settings pushed to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    pub searchable_attributes: Vec<String>,
    pub ranking: Vec<String>,
    pub hits_per_page: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            searchable_attributes: vec!["name".into()],
            ranking: ["attribute", "geo", "words", "filters", "exact"]
                .into_iter()
                .map(String::from)
                .collect(),
            hits_per_page: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: String,
    pub page: u32,
}

impl SearchQuery {
    /// First page of results for `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { query: text.into(), page: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<Value>,
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub nb_pages: u32,
    #[serde(default)]
    pub hits_per_page: u32,
}

impl SearchResponse {
    /// Decode every hit into `T`.
    pub fn decode_hits<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.hits
            .iter()
            .map(|hit| serde_json::from_value(hit.clone()).map_err(Error::Hit))
            .collect()
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync + Debug {
    async fn set_settings(&self, settings: &IndexSettings) -> Result<()>;

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsTask {
    #[serde(rename = "taskID")]
    task_id: u64,
    #[serde(default)]
    updated_at: Option<String>,
}

/// REST client for an Algolia index.
#[derive(Debug, Clone)]
pub struct AlgoliaIndex {
    app_id: String,
    api_key: String,
    index_name: String,
    read_url: String,
    write_url: String,
    http: reqwest::Client,
}

impl AlgoliaIndex {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let (read_url, write_url) = match &config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/').to_string();
                (base.clone(), base)
            }
            None => (
                format!("https://{}-dsn.algolia.net", config.app_id),
                format!("https://{}.algolia.net", config.app_id),
            ),
        };

        Ok(Self {
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
            read_url,
            write_url,
            http,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let res = request
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                service: Service::SearchIndex,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        if body.trim().is_empty() {
            return Err(Error::EmptyBody { service: Service::SearchIndex });
        }

        serde_json::from_str(&body).map_err(|source| Error::Parse {
            service: Service::SearchIndex,
            source,
        })
    }
}

#[async_trait]
impl SearchIndex for AlgoliaIndex {
    async fn set_settings(&self, settings: &IndexSettings) -> Result<()> {
        let url = format!("{}/1/indexes/{}/settings", self.write_url, self.index_name);
        debug!(%url, "Updating index settings");

        let task: SettingsTask = self.send(self.http.put(&url).json(settings)).await?;
        debug!(task_id = task.task_id, updated_at = ?task.updated_at, "Index settings accepted");
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let url = format!("{}/1/indexes/{}/query", self.read_url, self.index_name);
        debug!(%url, query = %query.query, page = query.page, "Searching index");

        self.send(self.http.post(&url).json(query)).await
    }
}

/// Construct the search index client from config.
pub fn index_from_config(config: &Config) -> anyhow::Result<Arc<dyn SearchIndex>> {
    let search = config.search()?;
    Ok(Arc::new(AlgoliaIndex::new(search)?))
}
