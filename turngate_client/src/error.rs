#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// 4xx from the engine. Terminal: another attempt cannot change it.
    #[error("engine returned client error {status}: {body}")]
    ClientStatus { status: StatusCode, body: String },

    /// Any non-success, non-4xx status from the engine.
    #[error("engine returned status {status}: {body}")]
    ServerStatus { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode engine response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("connection strategy error: {0}")]
    Strategy(anyhow::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid header {name}: {reason}")]
    Header { name: String, reason: String },
}

impl Error {
    /// Whether another attempt may change the outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerStatus { .. } | Self::Network(_))
    }
}
