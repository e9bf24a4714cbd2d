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

//! Data model and collaborator seams for the turngate engine transport.
//!
//! Everything public here is plain, clonable, serde-serializable data or an
//! async trait over such data, so the whole surface stays usable from host
//! embeddings that can only pass structured values across their boundary.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Opaque activity payload forwarded verbatim to the engine.
pub type Activity = Value;

/// Canonical continuation signal attached to every turn response.
///
/// `Continue` tells the caller to immediately issue another `continue_turn`;
/// `Waiting` tells it to pause for external input first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuationKind {
    Continue,
    #[default]
    Waiting,
}

impl ContinuationKind {
    /// Normalize a raw continuation token from the engine.
    ///
    /// The server vocabulary has drifted in casing across deployments, so
    /// any case-insensitive spelling of "continue" maps to `Continue` and
    /// everything else falls back to the conservative `Waiting`.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("continue") {
            Self::Continue
        } else {
            Self::Waiting
        }
    }

    #[must_use]
    pub const fn should_continue(self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Per-call connection parameters produced by a [`ConnectionStrategy`].
///
/// Owned transiently by the operation that requested it; never cached or
/// reused across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequestContext {
    /// Base authority for the request. Query string and fragment on this URL
    /// are routing context and survive path resolution.
    pub base_url: String,
    /// Operation body prepared by the strategy, if any.
    #[serde(default)]
    pub body: Option<Value>,
    /// Headers prepared by the strategy (e.g. authorization).
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl TurnRequestContext {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            body: None,
            headers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A continuation-normalized engine response.
///
/// The raw `action` token is rewritten to the canonical [`ContinuationKind`]
/// before the response reaches the caller; every other field the server sent
/// is preserved verbatim in `payload`.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub action: ContinuationKind,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl TurnResponse {
    /// Build a response from a decoded wire value, normalizing the
    /// continuation token. A non-object body yields an empty payload.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let mut payload = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let action = payload
            .remove("action")
            .as_ref()
            .and_then(Value::as_str)
            .map_or(ContinuationKind::Waiting, ContinuationKind::from_token);
        Self { action, payload }
    }

    /// Conversation identifier from the payload, when the engine sent one.
    #[must_use]
    pub fn conversation_id(&self) -> Option<&str> {
        self.payload.get("conversationId").and_then(Value::as_str)
    }
}

impl<'de> Deserialize<'de> for TurnResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(value))
    }
}

/// Request data for starting a new conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    /// Ask the engine to emit its greeting activities for the new
    /// conversation.
    pub emit_start_conversation_event: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Opaque tracing identifier, forwarded as a request header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Default for StartConversationRequest {
    fn default() -> Self {
        Self {
            emit_start_conversation_event: true,
            locale: None,
            correlation_id: None,
        }
    }
}

impl StartConversationRequest {
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Request data for executing a turn on an existing conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteTurnRequest {
    pub conversation_id: String,
    /// Opaque activity payload sent to the engine as the turn input.
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ExecuteTurnRequest {
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, activity: Activity) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            activity,
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Request data for continuing an in-progress turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueTurnRequest {
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ContinueTurnRequest {
    #[must_use]
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Metadata attached to a telemetry exception report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionMetadata {
    /// Which handling path produced the report.
    pub handled_at: String,
    /// Attempt budget of that path.
    pub retry_count: u32,
}

impl ExceptionMetadata {
    /// Metadata for a failure that went through the retrying transport.
    #[must_use]
    pub fn retried(retry_count: u32) -> Self {
        Self {
            handled_at: "withRetries".to_string(),
            retry_count,
        }
    }
}

/// Supplier of per-call connection parameters, one prepare operation per
/// protocol operation.
#[async_trait]
pub trait ConnectionStrategy: Send + Sync {
    async fn prepare_start_new_conversation(&self) -> anyhow::Result<TurnRequestContext>;
    async fn prepare_execute_turn(&self) -> anyhow::Result<TurnRequestContext>;
    async fn prepare_continue_turn(&self) -> anyhow::Result<TurnRequestContext>;
}

/// Fire-and-forget exception reporter.
///
/// Implementations must not assume anyone awaits the returned future on a
/// request path; the transport detaches every report.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn track_exception(&self, error: String, metadata: ExceptionMetadata);
}

/// The three-operation conversation protocol as a plain async interface.
///
/// Operations take and return only transferable data; cancellation is an
/// externally owned token that the implementation observes but never
/// triggers. A fresh, never-cancelled token is the "no signal" case.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn start_new_conversation(
        &self,
        request: StartConversationRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<TurnResponse>;

    async fn execute_turn(
        &self,
        request: ExecuteTurnRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<TurnResponse>;

    async fn continue_turn(
        &self,
        request: ContinueTurnRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<TurnResponse>;
}
