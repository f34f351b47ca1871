// src/error.rs
use thiserror::Error;

/// Failures talking to the token-query API
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures delivering an alert to the chat channel
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("chat API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat API responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("channel {0} is not a text channel")]
    NotTextChannel(u64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode set: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not persist subscribers: {0}")]
    Store(#[from] StoreError),
    #[error("missing user id")]
    MissingUser,
}

#[derive(Debug, Error)]
pub enum HolderError {
    #[error("holder API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("holder API responded with status {0}")]
    Status(reqwest::StatusCode),
}
