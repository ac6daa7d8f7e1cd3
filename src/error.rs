//! Error types shared by the parsers and fetch helpers

use thiserror::Error;

/// Failures surfaced by ingestion.
///
/// Only a missing root marker is fatal for parsing; everything else in the
/// input degrades to empty fields or skipped entries.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is missing its required root marker/element
    #[error("format error: {0}")]
    Format(String),

    /// HTTP or transport failure while fetching a source
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Local file or decompression failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP error {code} {reason} fetching {url}")]
    Status {
        url: String,
        code: u16,
        reason: String,
    },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl Error {
    pub(crate) fn missing_header(marker: &str) -> Self {
        Error::Format(format!("missing required playlist header `{}`", marker))
    }

    pub(crate) fn missing_root(element: &str) -> Self {
        Error::Format(format!("missing required root element <{}>", element))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
