
// Error type shared by the driver, the sweep runner and the export helpers. Failures surface at
// the call that caused them and nothing is retried.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Instrument is not connected")]
    NotConnected,

    #[error("Instrument is already connected")]
    AlreadyConnected,

    #[error("Session was closed; create a new handle to reconnect")]
    SessionClosed,

    #[error("Transport failure: {0}")]
    Transport(#[from] io::Error),

    #[error("{parameter} of {requested} is out of range; {allowed}")]
    OutOfRange {
        parameter: &'static str,
        requested: f64,
        allowed: Allowed,
    },

    #[error("Malformed response to '{command}': {response:?}")]
    MalformedResponse { command: String, response: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unable to parse settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unable to write {path:?}: {source}")]
    Export { path: PathBuf, source: io::Error },

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(command: &str, response: &str) -> Self {
        Error::MalformedResponse {
            command: command.to_owned(),
            response: response.to_owned(),
        }
    }
}

/// The legal values a rejected request was checked against.
#[derive(Debug, Clone, PartialEq)]
pub enum Allowed {
    Interval { min: f64, max: f64 },
    Discrete(&'static [f64]),
}

impl fmt::Display for Allowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allowed::Interval { min, max } => write!(f, "must be within {} to {}", min, max),
            Allowed::Discrete(values) => {
                write!(f, "available ranges are [")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:e}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}
