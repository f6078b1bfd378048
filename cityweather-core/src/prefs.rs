//! Local key-value persistence for favorites and app flags.
//!
//! Everything lives in a single JSON document. Each write is a
//! read-modify-write of the whole document, serialized by a mutex so writes
//! to different keys never clobber each other. The lock is taken on the
//! blocking thread, so aborting the caller cannot release it mid-write.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{sync::Mutex, task};
use tracing::debug;

use crate::{
    Config,
    error::{Error, Result},
};

/// One of the three favorite slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavoriteSlot {
    First,
    Second,
    Third,
}

impl FavoriteSlot {
    pub const fn all() -> &'static [FavoriteSlot] {
        &[FavoriteSlot::First, FavoriteSlot::Second, FavoriteSlot::Third]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteSlot::First => "first",
            FavoriteSlot::Second => "second",
            FavoriteSlot::Third => "third",
        }
    }

    /// Key under which the slot's geoname id is stored.
    pub fn geoname_key(&self) -> &'static str {
        match self {
            FavoriteSlot::First => "first_geoname_id",
            FavoriteSlot::Second => "second_geoname_id",
            FavoriteSlot::Third => "third_geoname_id",
        }
    }
}

impl std::fmt::Display for FavoriteSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FavoriteSlot {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "first" | "1" => Ok(FavoriteSlot::First),
            "second" | "2" => Ok(FavoriteSlot::Second),
            "third" | "3" => Ok(FavoriteSlot::Third),
            _ => Err(anyhow::anyhow!(
                "Unknown favorite slot '{value}'. Supported slots: first, second, third."
            )),
        }
    }
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_save_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_save_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_save_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_geoname_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub geoname_ids: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved_is_coordinated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_first_app_start: Option<bool>,
}

impl Preferences {
    pub fn save_name(&self, slot: FavoriteSlot) -> Option<&str> {
        match slot {
            FavoriteSlot::First => self.first_save_name.as_deref(),
            FavoriteSlot::Second => self.second_save_name.as_deref(),
            FavoriteSlot::Third => self.third_save_name.as_deref(),
        }
    }

    fn save_name_mut(&mut self, slot: FavoriteSlot) -> &mut Option<String> {
        match slot {
            FavoriteSlot::First => &mut self.first_save_name,
            FavoriteSlot::Second => &mut self.second_save_name,
            FavoriteSlot::Third => &mut self.third_save_name,
        }
    }

    pub fn geoname_id(&self, key: &str) -> Option<&str> {
        self.geoname_ids.get(key).map(String::as_str)
    }

    /// Whether the last saved location was given as coordinates. Defaults to `false`.
    pub fn last_saved_is_coordinated(&self) -> bool {
        self.last_saved_is_coordinated.unwrap_or(false)
    }

    /// Defaults to `true` until something records otherwise.
    pub fn is_first_app_start(&self) -> bool {
        self.is_first_app_start.unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store at the configured preference path. Needs no service credentials.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.preferences_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document; a missing file reads as defaults.
    pub async fn load(&self) -> Result<Preferences> {
        let path = Arc::clone(&self.path);
        task::spawn_blocking(move || read_document(&path))
            .await
            .map_err(|e| Error::Storage(format!("preference read task failed: {e}")))?
    }

    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Preferences) + Send + 'static,
    {
        let lock = Arc::clone(&self.write_lock);
        let path = Arc::clone(&self.path);

        task::spawn_blocking(move || {
            let _guard = lock.blocking_lock();
            let mut prefs = read_document(&path)?;
            apply(&mut prefs);
            write_document(&path, &prefs)
        })
        .await
        .map_err(|e| Error::Storage(format!("preference write task failed: {e}")))?
    }

    pub async fn write_save_name(&self, slot: FavoriteSlot, name: String) -> Result<()> {
        debug!(%slot, %name, "Saving favorite name");
        self.update(move |p| *p.save_name_mut(slot) = Some(name)).await
    }

    pub async fn write_last_geoname_id(&self, geoname_id: String) -> Result<()> {
        debug!(%geoname_id, "Saving last geoname id");
        self.update(move |p| p.last_geoname_id = Some(geoname_id)).await
    }

    pub async fn write_geoname_id(&self, key: String, geoname_id: String) -> Result<()> {
        debug!(%key, %geoname_id, "Saving geoname id");
        self.update(move |p| {
            p.geoname_ids.insert(key, geoname_id);
        })
        .await
    }

    /// Store a favorite city: its name and geoname id in `slot`, and make it
    /// the last shown location. One document update.
    pub async fn write_favorite(
        &self,
        slot: FavoriteSlot,
        name: String,
        geoname_id: String,
    ) -> Result<()> {
        debug!(%slot, %name, %geoname_id, "Saving favorite");
        self.update(move |p| {
            *p.save_name_mut(slot) = Some(name);
            p.geoname_ids.insert(slot.geoname_key().to_string(), geoname_id.clone());
            p.last_geoname_id = Some(geoname_id);
            p.last_saved_is_coordinated = Some(false);
        })
        .await
    }

    pub async fn write_last_saved_is_coordinated(&self, value: bool) -> Result<()> {
        self.update(move |p| p.last_saved_is_coordinated = Some(value)).await
    }

    pub async fn write_is_first_app_start(&self, value: bool) -> Result<()> {
        self.update(move |p| p.is_first_app_start = Some(value)).await
    }
}

fn read_document(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        return Ok(Preferences::default());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Preferences::default());
    }

    serde_json::from_str(&contents)
        .map_err(|e| Error::Storage(format!("{} is not valid: {e}", path.display())))
}

fn write_document(path: &Path, prefs: &Preferences) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(prefs)
        .map_err(|e| Error::Storage(format!("failed to serialize preferences: {e}")))?;

    // Write next to the target and rename so readers never see a partial file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
