//! Shipped telemetry sinks.

use async_trait::async_trait;
use tracing::error;

use turngate_core::{ExceptionMetadata, TelemetrySink};

/// Sink that logs exception reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

#[async_trait]
impl TelemetrySink for TracingTelemetrySink {
    async fn track_exception(&self, error: String, metadata: ExceptionMetadata) {
        error!(
            handled_at = %metadata.handled_at,
            retry_count = metadata.retry_count,
            "Engine request failed: {error}"
        );
    }
}

/// Sink that drops every report, for embeddings that opt out of telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetrySink;

#[async_trait]
impl TelemetrySink for NoopTelemetrySink {
    async fn track_exception(&self, _error: String, _metadata: ExceptionMetadata) {}
}
