//! Interactive conversation command.
//!
//! Starts a conversation on the configured engine and runs turns against it,
//! transparently following the engine's continuation signals.

use std::io::Write;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use turngate_client::EngineClient;
use turngate_config::Config;
use turngate_core::{
    ContinueTurnRequest, ExecuteTurnRequest, StartConversationRequest, TurnResponse,
};

use super::build_client;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Locale override for the conversation
    pub locale: Option<String>,
}

/// Strategy for executing the Chat command.
///
/// - Starts a fresh conversation and prints the engine's greeting
/// - Reads user input and executes turns until the user quits
/// - Issues `continue_turn` while the engine signals `Continue`
/// - Cancels in-flight work on Ctrl-C through a shared token
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        info!("Loaded config from ~/turngate/config.json");

        let client = build_client(&config)?;
        let cancel = CancellationToken::new();

        // Ctrl-C cancels whatever call is in flight.
        let ctrlc = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrlc.cancel();
            }
        });

        // One correlation id per session so engine-side traces can be joined.
        let correlation_id = Uuid::now_v7().to_string();

        let mut start =
            StartConversationRequest::default().with_correlation_id(correlation_id.clone());
        if let Some(locale) = input.locale.or(config.engine.locale) {
            start = start.with_locale(locale);
        }

        let response = client.start_new_conversation(&start, &cancel).await?;
        let conversation_id = response
            .conversation_id()
            .ok_or_else(|| anyhow::anyhow!("Engine did not return a conversation id"))?
            .to_string();

        print_activities(&response);
        drain_continuations(&client, &conversation_id, &correlation_id, response, &cancel).await?;

        if let Some(text) = input.message {
            // Single message mode
            run_turn(&client, &conversation_id, &correlation_id, &text, &cancel).await?;
            return Ok(());
        }

        run_interactive(&client, &conversation_id, &correlation_id, &cancel).await
    }
}

/// Interactive conversation loop over stdin/stdout.
async fn run_interactive(
    client: &EngineClient,
    conversation_id: &str,
    correlation_id: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    println!("=== Conversation: {conversation_id} ===");
    println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if matches!(input, "exit" | "quit" | "q") {
            break;
        }

        if input.is_empty() {
            continue;
        }

        if let Err(e) = run_turn(client, conversation_id, correlation_id, input, cancel).await {
            eprintln!("Error: {e}");
        }
    }

    Ok(())
}

/// Execute one user turn, then follow continuation signals until the engine
/// waits for input again.
async fn run_turn(
    client: &EngineClient,
    conversation_id: &str,
    correlation_id: &str,
    text: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let activity = json!({"type": "message", "text": text});
    let request =
        ExecuteTurnRequest::new(conversation_id, activity).with_correlation_id(correlation_id);

    let response = client.execute_turn(&request, cancel).await?;
    print_activities(&response);
    drain_continuations(client, conversation_id, correlation_id, response, cancel).await?;

    Ok(())
}

/// Issue `continue_turn` while the engine keeps signalling `Continue`.
async fn drain_continuations(
    client: &EngineClient,
    conversation_id: &str,
    correlation_id: &str,
    mut response: TurnResponse,
    cancel: &CancellationToken,
) -> anyhow::Result<TurnResponse> {
    while response.action.should_continue() {
        let request =
            ContinueTurnRequest::new(conversation_id).with_correlation_id(correlation_id);
        response = client.continue_turn(&request, cancel).await?;
        print_activities(&response);
    }

    Ok(response)
}

/// Print the text of any message activities in the payload. The payload is
/// engine-defined; activities without a text field are skipped.
fn print_activities(response: &TurnResponse) {
    let Some(activities) = response.payload.get("activities").and_then(Value::as_array) else {
        return;
    };

    for activity in activities {
        if let Some(text) = activity.get("text").and_then(Value::as_str) {
            println!("{text}");
        }
    }
}
