//! Error type shared by the forecast, search and preference adapters.

use thiserror::Error;

/// Which remote service produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    OpenWeather,
    SearchIndex,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::OpenWeather => f.write_str("OpenWeather"),
            Service::SearchIndex => f.write_str("search index"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: Service,
        status: u16,
        body: String,
    },

    #[error("{service} returned an empty response body")]
    EmptyBody { service: Service },

    #[error("Failed to parse {service} response: {source}")]
    Parse {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode search hit: {0}")]
    Hit(#[source] serde_json::Error),

    #[error("Preference storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// User-friendly message for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Network(_) => "Network error. Check your connection.",
            Error::Status { status: 401, .. } => {
                "The API key was rejected. Run `cityweather configure`."
            }
            Error::Status { status: 404, .. } => "Location not found.",
            Error::Status { .. } => "The service returned an error. Please try again.",
            Error::EmptyBody { .. } | Error::Parse { .. } | Error::Hit(_) => {
                "The service returned an unexpected response."
            }
            Error::Storage(_) | Error::Io(_) => "Could not access local preferences.",
        }
    }
}

/// Shorten a response body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
