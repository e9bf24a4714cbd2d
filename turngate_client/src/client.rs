//! The three-operation conversation protocol.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use turngate_core::{
    ConnectionStrategy, ContinueTurnRequest, ConversationApi, ExecuteTurnRequest,
    StartConversationRequest, TelemetrySink, TurnRequestContext, TurnResponse,
};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::transport::RetryingTransport;
use crate::urls::resolve_with_base_context;

const HEADER_CONVERSATION_ID: &str = "x-ms-conversationid";
const HEADER_CORRELATION_ID: &str = "x-ms-correlationid";

/// Client for a remote turn-processing engine.
///
/// Each operation asks the injected strategy for fresh connection
/// parameters, resolves the operation path against the strategy's base URL
/// (preserving the base's query and fragment), sends one retried POST, and
/// normalizes the continuation token on the response.
///
/// The client holds no per-conversation state; concurrent calls on
/// different conversations need no coordination.
pub struct EngineClient {
    strategy: Arc<dyn ConnectionStrategy>,
    transport: RetryingTransport,
}

impl EngineClient {
    pub fn new(
        strategy: Arc<dyn ConnectionStrategy>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self> {
        Ok(Self {
            strategy,
            transport: RetryingTransport::new(telemetry)?,
        })
    }

    /// Client with a custom retry policy.
    pub fn with_policy(
        strategy: Arc<dyn ConnectionStrategy>,
        telemetry: Arc<dyn TelemetrySink>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            strategy,
            transport: RetryingTransport::with_policy(telemetry, policy)?,
        })
    }

    /// Start a new conversation on the engine.
    pub async fn start_new_conversation(
        &self,
        request: &StartConversationRequest,
        cancel: &CancellationToken,
    ) -> Result<TurnResponse> {
        let mut context = self
            .strategy
            .prepare_start_new_conversation()
            .await
            .map_err(Error::Strategy)?;

        let mut body = into_object(context.body.take());
        body.insert(
            "emitStartConversationEvent".to_string(),
            Value::Bool(request.emit_start_conversation_event),
        );
        if let Some(locale) = &request.locale {
            body.insert("locale".to_string(), Value::String(locale.clone()));
        }

        let response = self
            .post(
                &context,
                "conversations",
                None,
                request.correlation_id.as_deref(),
                body,
                cancel,
            )
            .await?;

        info!(
            "Started conversation {}",
            response.conversation_id().unwrap_or("<unknown>")
        );
        Ok(response)
    }

    /// Execute one turn of an existing conversation.
    pub async fn execute_turn(
        &self,
        request: &ExecuteTurnRequest,
        cancel: &CancellationToken,
    ) -> Result<TurnResponse> {
        let mut context = self
            .strategy
            .prepare_execute_turn()
            .await
            .map_err(Error::Strategy)?;

        let mut body = into_object(context.body.take());
        body.insert("activity".to_string(), request.activity.clone());

        let path = format!("conversations/{}", request.conversation_id);
        self.post(
            &context,
            &path,
            Some(&request.conversation_id),
            request.correlation_id.as_deref(),
            body,
            cancel,
        )
        .await
    }

    /// Continue an in-progress turn after the engine signalled `Continue`.
    pub async fn continue_turn(
        &self,
        request: &ContinueTurnRequest,
        cancel: &CancellationToken,
    ) -> Result<TurnResponse> {
        let mut context = self
            .strategy
            .prepare_continue_turn()
            .await
            .map_err(Error::Strategy)?;

        let body = into_object(context.body.take());
        let path = format!("conversations/{}/continue", request.conversation_id);
        self.post(
            &context,
            &path,
            Some(&request.conversation_id),
            request.correlation_id.as_deref(),
            body,
            cancel,
        )
        .await
    }

    async fn post(
        &self,
        context: &TurnRequestContext,
        path: &str,
        conversation_id: Option<&str>,
        correlation_id: Option<&str>,
        body: Map<String, Value>,
        cancel: &CancellationToken,
    ) -> Result<TurnResponse> {
        let base = Url::parse(&context.base_url)?;
        let url = resolve_with_base_context(&base, path)?;
        let headers = build_headers(&context.headers, conversation_id, correlation_id)?;

        debug!("POST {url}");
        let raw = self
            .transport
            .post_json(url, &Value::Object(body), headers, cancel)
            .await?;

        Ok(TurnResponse::from_value(raw))
    }
}

#[async_trait]
impl ConversationApi for EngineClient {
    async fn start_new_conversation(
        &self,
        request: StartConversationRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<TurnResponse> {
        Ok(self.start_new_conversation(&request, &cancel).await?)
    }

    async fn execute_turn(
        &self,
        request: ExecuteTurnRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<TurnResponse> {
        Ok(self.execute_turn(&request, &cancel).await?)
    }

    async fn continue_turn(
        &self,
        request: ContinueTurnRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<TurnResponse> {
        Ok(self.continue_turn(&request, &cancel).await?)
    }
}

/// Strategy bodies are JSON objects; anything else contributes nothing.
fn into_object(body: Option<Value>) -> Map<String, Value> {
    match body {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn build_headers(
    strategy_headers: &HashMap<String, String>,
    conversation_id: Option<&str>,
    correlation_id: Option<&str>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in strategy_headers {
        insert_header(&mut headers, name, value)?;
    }
    if let Some(id) = conversation_id {
        insert_header(&mut headers, HEADER_CONVERSATION_ID, id)?;
    }
    if let Some(id) = correlation_id {
        insert_header(&mut headers, HEADER_CORRELATION_ID, id)?;
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Header {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| Error::Header {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    headers.insert(header_name, header_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_headers() {
        let mut strategy_headers = HashMap::new();
        strategy_headers.insert("authorization".to_string(), "Bearer t".to_string());

        let headers = build_headers(&strategy_headers, Some("c-1"), Some("corr-1"))
            .unwrap_or_else(|e| panic!("header build failed: {e}"));

        assert_eq!(headers.get(HEADER_CONVERSATION_ID).map(|v| v.as_bytes()), Some(&b"c-1"[..]));
        assert_eq!(headers.get(HEADER_CORRELATION_ID).map(|v| v.as_bytes()), Some(&b"corr-1"[..]));
        assert_eq!(headers.get("authorization").map(|v| v.as_bytes()), Some(&b"Bearer t"[..]));
    }

    #[test]
    fn test_optional_headers_absent() {
        let headers = build_headers(&HashMap::new(), None, None)
            .unwrap_or_else(|e| panic!("header build failed: {e}"));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut strategy_headers = HashMap::new();
        strategy_headers.insert("bad name".to_string(), "v".to_string());

        assert!(matches!(
            build_headers(&strategy_headers, None, None),
            Err(Error::Header { .. })
        ));
    }

    #[test]
    fn test_non_object_strategy_body_ignored() {
        assert!(into_object(Some(Value::String("nope".to_string()))).is_empty());
        assert!(into_object(None).is_empty());
    }
}
