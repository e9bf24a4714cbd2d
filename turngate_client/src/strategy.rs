//! Shipped connection strategies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use turngate_core::{ConnectionStrategy, TurnRequestContext};

/// Connection settings for a hosted engine endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Environment base URL. Routing query parameters on it (api version,
    /// session markers) are preserved on every request URL.
    pub environment_url: String,
    /// Bearer token presented on every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl EngineSettings {
    #[must_use]
    pub fn new(environment_url: impl Into<String>) -> Self {
        Self {
            environment_url: environment_url.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Strategy serving a fixed environment URL and bearer token for every
/// operation.
pub struct TokenConnectionStrategy {
    settings: EngineSettings,
}

impl TokenConnectionStrategy {
    #[must_use]
    pub const fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    fn prepare(&self) -> TurnRequestContext {
        let mut context = TurnRequestContext::new(self.settings.environment_url.clone());
        if let Some(token) = &self.settings.token {
            context = context.with_header("authorization", format!("Bearer {token}"));
        }
        context
    }
}

#[async_trait]
impl ConnectionStrategy for TokenConnectionStrategy {
    async fn prepare_start_new_conversation(&self) -> anyhow::Result<TurnRequestContext> {
        Ok(self.prepare())
    }

    async fn prepare_execute_turn(&self) -> anyhow::Result<TurnRequestContext> {
        Ok(self.prepare())
    }

    async fn prepare_continue_turn(&self) -> anyhow::Result<TurnRequestContext> {
        Ok(self.prepare())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_strategy_headers() {
        let strategy = TokenConnectionStrategy::new(
            EngineSettings::new("https://engine.example/e1/?api-version=1").with_token("secret"),
        );

        let context = strategy
            .prepare_execute_turn()
            .await
            .unwrap_or_else(|e| panic!("prepare failed: {e}"));

        assert_eq!(context.base_url, "https://engine.example/e1/?api-version=1");
        assert_eq!(
            context.headers.get("authorization").map(String::as_str),
            Some("Bearer secret")
        );
        assert!(context.body.is_none());
    }

    #[tokio::test]
    async fn test_tokenless_strategy_has_no_headers() {
        let strategy =
            TokenConnectionStrategy::new(EngineSettings::new("https://engine.example/e1/"));

        let context = strategy
            .prepare_start_new_conversation()
            .await
            .unwrap_or_else(|e| panic!("prepare failed: {e}"));

        assert!(context.headers.is_empty());
    }
}
