//! Binary crate for the `cityweather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() {
    let cmd = cli::Cli::parse();
    let verbose = cmd.verbose;

    let default_level = if cmd.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(err) = cmd.run().await {
        eprintln!("Error: {}", report(&err, verbose));
        std::process::exit(1);
    }
}

/// Short message for failures from the core crate, the full chain otherwise or with `-v`.
fn report(err: &anyhow::Error, verbose: bool) -> String {
    match err.downcast_ref::<cityweather_core::Error>() {
        Some(core) if !verbose => core.user_message().to_string(),
        _ => format!("{err:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn core_errors_show_user_message() {
        let err = anyhow::Error::from(cityweather_core::Error::Storage("locked".into()));
        assert_eq!(report(&err, false), "Could not access local preferences.");
    }

    #[test]
    fn verbose_shows_error_chain() {
        let err = anyhow::Error::from(cityweather_core::Error::Storage("locked".into()));
        assert!(report(&err, true).contains("Preference storage error: locked"));
    }

    #[test]
    fn other_errors_keep_their_hint() {
        let err = anyhow!("No search index configured.\nHint: run `cityweather configure`");
        assert!(report(&err, false).contains("Hint: run `cityweather configure`"));
    }
}
