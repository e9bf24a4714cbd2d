//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use std::sync::Arc;
use std::time::Duration;

use turngate_client::{
    EngineClient, EngineSettings, RetryPolicy, TokenConnectionStrategy, TracingTelemetrySink,
};
use turngate_config::Config;

mod chat;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Build an engine client from the loaded configuration.
fn build_client(config: &Config) -> anyhow::Result<EngineClient> {
    let mut settings = EngineSettings::new(config.engine.environment_url.clone());
    if let Some(token) = &config.engine.token {
        settings = settings.with_token(token.clone());
    }

    let policy = RetryPolicy::new(
        config
            .client
            .retry_delays_secs
            .iter()
            .copied()
            .map(Duration::from_secs)
            .collect(),
    );

    Ok(EngineClient::with_policy(
        Arc::new(TokenConnectionStrategy::new(settings)),
        Arc::new(TracingTelemetrySink),
        policy,
    )?)
}

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via an associated type, so
/// parameters stay type-safe without boxing or runtime casting.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
