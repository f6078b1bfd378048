use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: u32,
    pub humidity: u8,
    #[serde(default)]
    pub sea_level: Option<u32>,
    #[serde(default)]
    pub grnd_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<u16>,
    #[serde(default)]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

/// Precipitation volume for the last three hours, in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "3h", default)]
    pub three_hours: Option<f64>,
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
}

/// One 3-hour step of the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<Conditions>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
    pub wind: Wind,
    #[serde(default)]
    pub visibility: Option<u32>,
    /// Probability of precipitation, 0.0..=1.0.
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    #[serde(default)]
    pub snow: Option<Precipitation>,
    pub dt_txt: String,
}

impl ForecastEntry {
    pub fn condition(&self) -> Option<&Conditions> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub id: u64,
    pub name: String,
    pub coord: Coord,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub population: Option<u64>,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i64,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

/// Body of the 5 day / 3 hour forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub cod: String,
    #[serde(default)]
    pub message: Option<f64>,
    pub cnt: u32,
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

/// Min/max temperature over one calendar day of the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRange {
    pub date: NaiveDate,
    pub min: f64,
    pub max: f64,
}

impl ForecastResponse {
    /// Min/max temperature per day, in the city's local time, ordered by date.
    pub fn daily_ranges(&self) -> Vec<DailyRange> {
        let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

        for entry in &self.list {
            let Some(local) = DateTime::from_timestamp(entry.dt + self.city.timezone, 0) else {
                continue;
            };
            let range = days
                .entry(local.date_naive())
                .or_insert((entry.main.temp_min, entry.main.temp_max));
            range.0 = range.0.min(entry.main.temp_min);
            range.1 = range.1.max(entry.main.temp_max);
        }

        days.into_iter()
            .map(|(date, (min, max))| DailyRange { date, min, max })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSys {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

/// Body of the current weather endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub id: u64,
    pub name: String,
    pub coord: Coord,
    pub weather: Vec<Conditions>,
    pub main: MainReadings,
    pub wind: Wind,
    pub dt: i64,
    #[serde(default)]
    pub sys: Option<CurrentSys>,
    #[serde(default)]
    pub timezone: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A search hit decoded into typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename = "geonameid", alias = "geoname_id", deserialize_with = "string_or_number")]
    pub geoname_id: String,
    #[serde(rename = "_geoloc", default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(rename = "objectID", default)]
    pub object_id: Option<String>,
}

/// Current conditions for one search item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub geoname_id: String,
    pub name: String,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
}

impl From<CurrentWeatherResponse> for CityInfo {
    fn from(current: CurrentWeatherResponse) -> Self {
        let (description, icon) = current
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        Self {
            geoname_id: current.id.to_string(),
            name: current.name,
            temperature: current.main.temp,
            description,
            icon,
        }
    }
}

/// Search items with their city info; `city_infos[i]` belongs to `items[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemModel {
    pub items: Vec<SearchItem>,
    pub city_infos: Vec<CityInfo>,
}

impl ItemModel {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SearchItem, Option<&CityInfo>)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (item, self.city_infos.get(i)))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
