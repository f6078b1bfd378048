use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_LANG: &str = "en";

const ENV_OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
const ENV_ALGOLIA_APP_ID: &str = "ALGOLIA_APP_ID";
const ENV_ALGOLIA_API_KEY: &str = "ALGOLIA_API_KEY";
const ENV_ALGOLIA_INDEX_NAME: &str = "ALGOLIA_INDEX_NAME";

/// OpenWeather credentials and request parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Overrides `https://api.openweathermap.org`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenWeatherConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            units: default_units(),
            lang: default_lang(),
            base_url: None,
        }
    }
}

/// Hosted search index credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    pub app_id: String,
    pub api_key: String,
    pub index_name: String,
    /// Overrides `https://{app_id}-dsn.algolia.net`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [openweather]
/// api_key = "..."
/// units = "metric"
/// lang = "en"
///
/// [search]
/// app_id = "..."
/// api_key = "..."
/// index_name = "cities"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Where the preference document lives. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<PathBuf>,

    pub openweather: Option<OpenWeatherConfig>,
    pub search: Option<SearchConfig>,
}

fn default_units() -> String {
    DEFAULT_UNITS.to_string()
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// Environment variables override file values.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Configured preference path, or `preferences.json` in the platform data dir.
    pub fn preferences_path(&self) -> Result<PathBuf> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("preferences.json")),
        }
    }

    /// Replace credentials with values from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_OPENWEATHER_API_KEY) {
            match self.openweather.as_mut() {
                Some(ow) => ow.api_key = key,
                None => self.openweather = Some(OpenWeatherConfig::new(key)),
            }
        }

        let app_id = lookup(ENV_ALGOLIA_APP_ID);
        let api_key = lookup(ENV_ALGOLIA_API_KEY);
        let index_name = lookup(ENV_ALGOLIA_INDEX_NAME);

        match self.search.as_mut() {
            Some(search) => {
                if let Some(v) = app_id {
                    search.app_id = v;
                }
                if let Some(v) = api_key {
                    search.api_key = v;
                }
                if let Some(v) = index_name {
                    search.index_name = v;
                }
            }
            None => {
                // A partial environment is not enough to build a search section.
                if let (Some(app_id), Some(api_key), Some(index_name)) =
                    (app_id, api_key, index_name)
                {
                    self.search = Some(SearchConfig {
                        app_id,
                        api_key,
                        index_name,
                        base_url: None,
                    });
                }
            }
        }
    }

    /// OpenWeather section, or an error with a hint on how to set it.
    pub fn openweather(&self) -> Result<&OpenWeatherConfig> {
        self.openweather.as_ref().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `cityweather configure` or set {ENV_OPENWEATHER_API_KEY}."
            )
        })
    }

    /// Search index section, or an error with a hint on how to set it.
    pub fn search(&self) -> Result<&SearchConfig> {
        self.search.as_ref().ok_or_else(|| {
            anyhow!(
                "No search index configured.\n\
                 Hint: run `cityweather configure` or set {ENV_ALGOLIA_APP_ID}, \
                 {ENV_ALGOLIA_API_KEY} and {ENV_ALGOLIA_INDEX_NAME}."
            )
        })
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "cityweather", "cityweather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
