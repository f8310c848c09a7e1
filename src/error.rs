use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading presence data, settings or exporting rows.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed presence log: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("time shift of {0} s is out of range (at most {max} s either way)", max = crate::model::label::MAX_TIME_SHIFT_SECS)]
    InvalidTimeShift(i64),

    #[error("failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("background loader stopped unexpectedly")]
    LoaderGone,
}

impl ViewerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Problems found while validating the filter controls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid user pattern: {0}")]
    InvalidPattern(String),

    #[error("no user matches '{0}'")]
    NoMatchingUsers(String),

    #[error("'{value}' is not a valid epoch for {field}")]
    InvalidEpoch { field: &'static str, value: String },

    #[error("time range is empty: from {from} is after to {to}")]
    EmptyRange { from: i64, to: i64 },

    #[error("tick frequency must be a positive integer, got '{0}'")]
    InvalidTickFrequency(String),

    #[error("invalid tick format '{0}'")]
    InvalidTickFormat(String),
}

impl From<regex::Error> for FilterError {
    fn from(err: regex::Error) -> Self {
        FilterError::InvalidPattern(err.to_string())
    }
}
