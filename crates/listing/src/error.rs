//! Error types for the listing crate.
//!
//! Every failure that can come out of the listing service client or the
//! exclude-file store is represented here, so callers can tell a transport
//! problem apart from a bad status code or a corrupt file.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the listing service or
/// reading/writing the exclude file.
#[derive(Error, Debug)]
pub enum ListingError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The listing service answered with an unexpected status code
    #[error("bad status {status} from {url}")]
    BadStatus { status: u16, url: String },

    /// A response body was not the JSON we expected
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required argument was empty
    #[error("{0} is required")]
    MissingArgument(&'static str),

    /// The exclude file could not be read or written
    #[error("exclude file {}: {source}", path.display())]
    ExcludeFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The exclude file exists but does not hold a valid exclusion list
    #[error("exclude file {} is malformed: {source}", path.display())]
    ExcludeFileFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ListingError>;
