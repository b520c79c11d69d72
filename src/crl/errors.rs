use std::path::PathBuf;

use thiserror::Error;

/// CRL-related errors
#[derive(Error, Debug)]
pub enum CrlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status}: failed to fetch CRL from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("CRL parsing failed: {0}")]
    Parse(String),

    #[error("Timeout while fetching CRL")]
    Timeout,

    #[error("Invalid CRL URL: {0}")]
    InvalidUrl(String),

    #[error("No CRL source configured")]
    NotConfigured,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenient Result type alias
pub type CrlResult<T> = Result<T, CrlError>;
