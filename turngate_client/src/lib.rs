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

//! Turn-based conversation transport over HTTP.
//!
//! [`EngineClient`] drives the three-operation protocol (start conversation,
//! execute turn, continue turn) against a remote turn-processing engine:
//! connection parameters come from an injected [`turngate_core::ConnectionStrategy`],
//! requests go through a bounded-retry POST transport with terminal/retryable
//! failure classification, and every response's continuation token is
//! normalized before it reaches the caller.

mod client;
mod error;
mod retry;
mod strategy;
mod telemetry;
mod transport;
mod urls;

pub use client::EngineClient;
pub use error::{Error, Result};
pub use retry::{RetryError, RetryPolicy, retry_with_backoff};
pub use strategy::{EngineSettings, TokenConnectionStrategy};
pub use telemetry::{NoopTelemetrySink, TracingTelemetrySink};
pub use transport::RetryingTransport;
pub use urls::resolve_with_base_context;
