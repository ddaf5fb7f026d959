use crate::telegram::method_url;
use dipwatch_core::config::TelegramConfig;
use dipwatch_core::notify::entity::ChatCommand;
use dipwatch_core::notify::error::NotifyError;
use dipwatch_core::notify::port::{ChatId, CommandHandler, Notifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay before polling again after a failed `getUpdates`.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: ChatId,
}

/// # Summary
/// Maps a chat message to a command.
///
/// # Logic
/// 1. `/start` and `/help` subscribe, `/stop` unsubscribes.
/// 2. A `@botname` suffix is ignored and matching is case-insensitive.
/// 3. Any other slash-command is ignored.
/// 4. Plain text subscribes.
pub fn parse_command(text: &str) -> Option<ChatCommand> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let Some(rest) = text.strip_prefix('/') else {
        return Some(ChatCommand::Subscribe);
    };

    let word = rest.split_whitespace().next().unwrap_or_default();
    let name = word.split('@').next().unwrap_or_default().to_lowercase();
    match name.as_str() {
        "start" | "help" => Some(ChatCommand::Subscribe),
        "stop" => Some(ChatCommand::Unsubscribe),
        _ => None,
    }
}

/// # Summary
/// Long-polling Telegram bot that turns chat messages into subscription commands.
///
/// # Invariants
/// * `offset` always points past the last processed update, so each update is
///   handled at most once.
/// * Replies go through the injected `Notifier`.
pub struct TelegramBot {
    bot_token: String,
    api_base: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
    handler: Arc<dyn CommandHandler>,
    notifier: Arc<dyn Notifier>,
    offset: i64,
}

impl TelegramBot {
    /// # Summary
    /// Creates a bot bound to a command handler and a reply channel.
    ///
    /// # Returns
    /// * The bot, or `NotifyError::Config` for an empty token.
    pub fn new(
        config: &TelegramConfig,
        handler: Arc<dyn CommandHandler>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, NotifyError> {
        if config.bot_token.trim().is_empty() {
            return Err(NotifyError::Config("telegram bot token is empty".into()));
        }
        dipwatch_core::install_crypto_provider();

        // long poll is held open server side, leave headroom on top of it
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs.saturating_add(5)))
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
            client,
            handler,
            notifier,
            offset: 0,
        })
    }

    /// # Summary
    /// Polls forever, backing off after errors.
    pub async fn run(mut self) {
        info!("Telegram bot polling started");
        loop {
            if let Err(e) = self.poll_once().await {
                error!("Telegram polling failed: {}", e);
                tokio::time::sleep(ERROR_BACKOFF).await;
            }
        }
    }

    /// # Summary
    /// Fetches one batch of updates and handles every message in it.
    ///
    /// # Logic
    /// 1. Calls `getUpdates` with the current offset.
    /// 2. Advances the offset past each update before handling it.
    /// 3. Dispatches text messages to the handler and sends its replies.
    ///    Reply failures are logged and do not stop the batch.
    ///
    /// # Returns
    /// * Number of updates received.
    pub async fn poll_once(&mut self) -> Result<usize, NotifyError> {
        let updates = self.fetch_updates().await?;
        let count = updates.len();

        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(parse_command) else {
                continue;
            };

            let chat_id = message.chat.id;
            debug!(chat_id = chat_id, command = ?command, "Command received");

            for reply in self.handler.handle(chat_id, command).await {
                if let Err(e) = self.notifier.send_text(chat_id, &reply).await {
                    warn!(chat_id = chat_id, "Reply failed: {}", e);
                }
            }
        }

        Ok(count)
    }

    async fn fetch_updates(&self) -> Result<Vec<Update>, NotifyError> {
        let url = method_url(&self.api_base, &self.bot_token, "getUpdates");
        let params = GetUpdates {
            offset: self.offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: &["message"],
        };

        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Platform(format!("getUpdates HTTP {}", status)));
        }

        let body: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Decode(e.to_string()))?;
        if !body.ok {
            return Err(NotifyError::Platform(
                body.description.unwrap_or_else(|| "getUpdates ok=false".to_string()),
            ));
        }

        Ok(body.result)
    }
}
