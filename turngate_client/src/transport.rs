//! Retrying JSON POST transport with failure classification.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use turngate_core::{ExceptionMetadata, TelemetrySink};

use crate::error::{Error, Result};
use crate::retry::{RetryError, RetryPolicy, retry_with_backoff};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const USER_AGENT: &str = concat!("turngate/", env!("CARGO_PKG_VERSION"));

/// POST transport that retries retryable failures up to a bounded budget.
///
/// Classification: a 4xx response is terminal and never retried; a 5xx (or
/// any other non-success status), a transport failure or a timeout is
/// retryable. The final error of a failed call is reported once to the
/// telemetry sink on a detached task before it propagates.
pub struct RetryingTransport {
    client: Client,
    policy: RetryPolicy,
    telemetry: Arc<dyn TelemetrySink>,
}

impl RetryingTransport {
    pub fn new(telemetry: Arc<dyn TelemetrySink>) -> Result<Self> {
        Self::with_policy(telemetry, RetryPolicy::default())
    }

    pub fn with_policy(telemetry: Arc<dyn TelemetrySink>, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            policy,
            telemetry,
        })
    }

    /// POST `body` as JSON and decode the JSON response body.
    ///
    /// Cancellation is observed between and during attempts; a cancelled
    /// call fails with [`Error::Cancelled`] and is not reported to
    /// telemetry. A response that arrives but fails to parse is a
    /// [`Error::Decode`], surfaced immediately without another attempt.
    pub async fn post_json(
        &self,
        url: Url,
        body: &Value,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let outcome = retry_with_backoff(
            || self.try_post(url.clone(), body, headers.clone()),
            &self.policy,
            cancel,
            Error::is_retryable,
        )
        .await;

        let text = match outcome {
            Ok(text) => text,
            Err(RetryError::Cancelled) => return Err(Error::Cancelled),
            Err(RetryError::Terminal(error) | RetryError::Exhausted(error)) => {
                self.report_failure(&error);
                return Err(error);
            }
        };

        serde_json::from_str(&text).map_err(Error::Decode)
    }

    /// One attempt: send the request and classify the outcome.
    async fn try_post(&self, url: Url, body: &Value, headers: HeaderMap) -> Result<String> {
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ClientStatus { status, body });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ServerStatus { status, body });
        }

        Ok(response.text().await?)
    }

    /// Report the final failure of a call, exactly once, on a detached task.
    ///
    /// The report is never awaited on the caller's path and cannot alter
    /// error propagation.
    fn report_failure(&self, error: &Error) {
        let telemetry = Arc::clone(&self.telemetry);
        let metadata = ExceptionMetadata::retried(self.policy.attempts());
        let message = error.to_string();

        tokio::spawn(async move {
            telemetry.track_exception(message, metadata).await;
        });
    }
}
