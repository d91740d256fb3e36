//! The errors that can occur while downloading.

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
#[derive(Debug, Error)]
pub enum Error {
    /// The given URL is not a recognized Spotify link, or refers to a
    /// resource type that cannot be downloaded.
    #[error("Invalid Spotify link: {0}")]
    Link(String),
    /// A required environment variable is missing or blank.
    #[error("Environment variables not properly configured! {0}")]
    EnvVariables(String),
    /// The Spotify API returned no usable data. Wraps the underlying cause.
    #[error("No data received from Spotify: {0}")]
    NoDataReceived(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A raw track record is missing a field the normalizer needs.
    #[error("Incomplete track record: {0}")]
    IncompleteRecord(String),
    /// The YouTube search returned nothing usable for the given query.
    #[error("No matching audio source found for '{0}'")]
    NoAudioSource(String),
    /// An error occurred while talking to YouTube.
    #[error("YouTube client error: {0}")]
    Youtube(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The external ffmpeg invocation failed.
    #[error("ffmpeg failed: {0}")]
    Transcode(String),
    /// An IO error occurred.
    #[error("An IO error occurred: {0}")]
    Io(#[from] std::io::Error),
    /// An error occurred while fetching over HTTP.
    #[error("An error occurred while fetching: {0}")]
    Http(#[from] reqwest::Error),
    /// An error occurred while reading or writing tags.
    #[error("An error occurred while writing tags: {0}")]
    Tag(#[from] lofty::error::LoftyError),
}
