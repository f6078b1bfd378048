use anyhow::{Context, Result, bail};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use inquire::{Password, Text};

use cityweather_core::{
    Config, FavoriteSlot, ForecastResponse, OpenWeatherConfig, PreferenceStore, SearchConfig,
    SearchListCoordinator, SearchListState, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Forecasts and city search")]
pub struct Cli {
    /// Log request details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set OpenWeather and search index credentials interactively.
    Configure,

    /// Show the forecast for coordinates or a geoname id.
    Forecast {
        #[arg(long, requires = "lon", conflicts_with = "geoname_id", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long)]
        geoname_id: Option<String>,
    },

    /// Search cities by name.
    Search {
        query: String,
    },

    /// Push the default ranking settings to the search index.
    InitIndex,

    /// Store a favorite city in one of the three slots.
    Favorite {
        /// first, second or third
        slot: String,
        name: String,
        geoname_id: String,
    },

    /// Print stored favorites and flags.
    Prefs,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Forecast { lat, lon, geoname_id } => {
                let config = Config::load()?;
                let provider = provider_from_config(&config)?;

                let forecast = match (lat, lon, geoname_id) {
                    (Some(lat), Some(lon), _) => provider.forecast_by_coordinates(lat, lon).await?,
                    (_, _, Some(id)) => provider.forecast_by_geoname_id(&id).await?,
                    _ => bail!("Give either --lat and --lon, or --geoname-id."),
                };

                print_forecast(&forecast);
                Ok(())
            }
            Command::Search { query } => {
                let config = Config::load()?;
                let coordinator = SearchListCoordinator::from_config(&config)?;

                coordinator.search(&query).await?;

                match coordinator.state() {
                    SearchListState::Success(model) => {
                        for (item, info) in model.iter() {
                            let place =
                                format!("{:<10} {}, {}", item.geoname_id, item.name, item.country);
                            match info {
                                Some(info) => println!(
                                    "{place}  {:.1}°  {}",
                                    info.temperature, info.description
                                ),
                                None => println!("{place}"),
                            }
                        }
                    }
                    SearchListState::NotFound => println!("No cities found for '{query}'."),
                    SearchListState::Loading => {}
                }
                Ok(())
            }
            Command::InitIndex => {
                let config = Config::load()?;
                let coordinator = SearchListCoordinator::from_config(&config)?;
                coordinator
                    .init_search_settings()
                    .await
                    .context("Index settings task panicked")?;
                println!("Index settings sent.");
                Ok(())
            }
            Command::Favorite { slot, name, geoname_id } => {
                let slot = FavoriteSlot::try_from(slot.as_str())?;
                let config = Config::load()?;
                let store = PreferenceStore::from_config(&config)?;

                store.write_favorite(slot, name.clone(), geoname_id).await?;

                println!("Saved {name} as {slot} favorite.");
                Ok(())
            }
            Command::Prefs => {
                let config = Config::load()?;
                let store = PreferenceStore::from_config(&config)?;
                let prefs = store.load().await?;

                println!("{}", store.path().display());

                for slot in FavoriteSlot::all() {
                    println!(
                        "{:<7} {} ({})",
                        slot.as_str(),
                        prefs.save_name(*slot).unwrap_or("-"),
                        prefs.geoname_id(slot.geoname_key()).unwrap_or("-"),
                    );
                }
                let last = prefs.last_geoname_id.as_deref().unwrap_or("-");
                println!("last geoname id:     {last}");
                println!("last saved is coord: {}", prefs.last_saved_is_coordinated());
                println!("first app start:     {}", prefs.is_first_app_start());
                Ok(())
            }
        }
    }
}

fn configure() -> Result<()> {
    // Read the file directly so environment overrides are not written back.
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let existing = config.openweather.clone();
    let api_key = prompt_secret(
        "OpenWeather API key:",
        existing.as_ref().map(|ow| ow.api_key.as_str()),
    )?;
    let units = Text::new("Units (metric, imperial, standard):")
        .with_default(existing.as_ref().map_or("metric", |ow| ow.units.as_str()))
        .prompt()?;
    let lang = Text::new("Language code:")
        .with_default(existing.as_ref().map_or("en", |ow| ow.lang.as_str()))
        .prompt()?;

    let mut ow = OpenWeatherConfig::new(api_key);
    ow.units = units;
    ow.lang = lang;
    ow.base_url = existing.and_then(|ow| ow.base_url);
    config.openweather = Some(ow);

    let app_id = Text::new("Search index application id (empty to skip):").prompt()?;
    if !app_id.trim().is_empty() {
        let stored = config.search.as_ref().map(|s| s.api_key.as_str());
        let api_key = prompt_secret("Search index API key:", stored)?;
        let index_name = Text::new("Index name:").with_default("cities").prompt()?;
        config.search = Some(SearchConfig {
            app_id: app_id.trim().to_string(),
            api_key,
            index_name,
            base_url: None,
        });
    }

    config.save_to(&path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

/// Ask for a secret. An empty answer keeps `existing`; without one, input is required.
fn prompt_secret(message: &str, existing: Option<&str>) -> Result<String> {
    let existing = existing.filter(|key| !key.is_empty());
    let prompt = Password::new(message).without_confirmation();
    let input = match existing {
        Some(_) => prompt.with_help_message("Leave empty to keep the stored key").prompt()?,
        None => prompt.with_validator(inquire::required!()).prompt()?,
    };
    Ok(keep_or_replace(input, existing))
}

fn keep_or_replace(input: String, existing: Option<&str>) -> String {
    match existing {
        Some(key) if input.trim().is_empty() => key.to_string(),
        _ => input.trim().to_string(),
    }
}

fn print_forecast(forecast: &ForecastResponse) {
    let city = &forecast.city;
    println!("{}, {} ({})", city.name, city.country, city.id);

    for day in forecast.daily_ranges() {
        println!("  {}  {:>5.1}° / {:>5.1}°", day.date.format("%a %d %b"), day.min, day.max);
    }

    println!();
    for entry in &forecast.list {
        let when = DateTime::from_timestamp(entry.dt + city.timezone, 0)
            .map(|t| t.format("%a %H:%M").to_string())
            .unwrap_or_else(|| entry.dt_txt.clone());
        let condition = entry.condition().map_or("Unknown", |c| c.description.as_str());

        println!(
            "  {when}  {:>5.1}°  {:>3}%  {:>4.1} m/s  {condition}",
            entry.main.temp,
            (entry.pop * 100.0).round() as u8,
            entry.wind.speed,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_accepts_negative_coordinates() {
        let args = ["cityweather", "forecast", "--lat", "-33.9", "--lon", "18.4"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Command::Forecast { lat, lon, geoname_id } => {
                assert_eq!(lat, Some(-33.9));
                assert_eq!(lon, Some(18.4));
                assert!(geoname_id.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn forecast_rejects_lat_without_lon() {
        assert!(Cli::try_parse_from(["cityweather", "forecast", "--lat", "1.0"]).is_err());
    }

    #[test]
    fn forecast_rejects_coordinates_with_geoname_id() {
        let args = ["cityweather", "forecast", "--lat", "1", "--lon", "2", "--geoname-id", "3"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn favorite_takes_slot_name_and_id() {
        let args = ["cityweather", "-v", "favorite", "second", "Lyon", "2996944"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Favorite { slot, name, geoname_id } => {
                assert_eq!(slot, "second");
                assert_eq!(name, "Lyon");
                assert_eq!(geoname_id, "2996944");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn empty_secret_keeps_stored_key() {
        assert_eq!(keep_or_replace(String::new(), Some("STORED")), "STORED");
        assert_eq!(keep_or_replace("  ".into(), Some("STORED")), "STORED");
    }

    #[test]
    fn typed_secret_replaces_stored_key() {
        assert_eq!(keep_or_replace(" NEW ".into(), Some("STORED")), "NEW");
        assert_eq!(keep_or_replace("FIRST".into(), None), "FIRST");
    }
}
