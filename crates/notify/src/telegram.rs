use async_trait::async_trait;
use dipwatch_core::config::TelegramConfig;
use dipwatch_core::notify::error::NotifyError;
use dipwatch_core::notify::port::{ChatId, Notifier};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// # Summary
/// A notifier implementation that sends plain-text messages via the Telegram Bot API.
///
/// # Invariants
/// * `bot_token` is non-empty.
/// * One instance can deliver to any chat the bot has access to.
#[derive(Clone)]
pub struct TelegramNotifier {
    /// The Bot API token.
    bot_token: String,
    /// API root, e.g. `https://api.telegram.org`.
    api_base: String,
    /// The HTTP client used for requests.
    client: reqwest::Client,
}

/// Payload structure for Telegram `sendMessage` API.
#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: ChatId,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Envelope shared by every Bot API response.
#[derive(Deserialize)]
struct ApiStatus {
    ok: bool,
    description: Option<String>,
}

/// Longest text Telegram accepts in one `sendMessage`, in characters.
pub const MESSAGE_LIMIT: usize = 4096;

/// # Summary
/// Splits `text` into chunks of at most `limit` characters.
///
/// # Logic
/// 1. Lines are packed greedily and only broken at `\n`.
/// 2. A single line longer than `limit` is cut at character boundaries.
///
/// # Returns
/// * The chunks in their original order. Text within the limit comes back
///   as one chunk.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > limit {
            if started {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                started = false;
            }
            let chars: Vec<char> = line.chars().collect();
            chunks.extend(chars.chunks(limit).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        if started && current_len + 1 + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
            started = false;
        }

        if started {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
        started = true;
    }

    if started || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Builds `{api_base}/bot{token}/{method}`.
pub(crate) fn method_url(api_base: &str, bot_token: &str, method: &str) -> String {
    format!("{}/bot{}/{}", api_base.trim_end_matches('/'), bot_token, method)
}

impl TelegramNotifier {
    /// # Summary
    /// Creates a new `TelegramNotifier`.
    ///
    /// # Logic
    /// 1. Rejects an empty bot token.
    /// 2. Builds an HTTP client with a bounded request timeout.
    ///
    /// # Arguments
    /// * `config` - Telegram section of the application config.
    ///
    /// # Returns
    /// * A new instance of `TelegramNotifier` or `NotifyError::Config`.
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.trim().is_empty() {
            return Err(NotifyError::Config("telegram bot token is empty".into()));
        }
        dipwatch_core::install_crypto_provider();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.clone(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// # Summary
    /// Sends `text` to `chat_id` as plain messages.
    ///
    /// # Logic
    /// 1. Splits text longer than `MESSAGE_LIMIT` into line-aligned chunks.
    /// 2. POSTs each chunk to `sendMessage` in order, stopping at the first failure.
    ///
    /// # Returns
    /// * `Ok(())` if every chunk was accepted.
    /// * `Err(NotifyError)` otherwise.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        for chunk in split_message(text, MESSAGE_LIMIT) {
            self.send_chunk(chat_id, &chunk).await?;
        }
        Ok(())
    }
}

impl TelegramNotifier {
    /// Treats a non-success status or `ok: false` as a platform error.
    async fn send_chunk(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        let url = method_url(&self.api_base, &self.bot_token, "sendMessage");
        let payload = SendMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Platform(format!(
                "Telegram API error {}: {}",
                status, error_text
            )));
        }

        let body: ApiStatus = response
            .json()
            .await
            .map_err(|e| NotifyError::Decode(e.to_string()))?;
        if !body.ok {
            return Err(NotifyError::Platform(
                body.description.unwrap_or_else(|| "ok=false".to_string()),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        assert_eq!(
            method_url("https://api.telegram.org/", "123:abc", "getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn test_split_keeps_short_text_whole() {
        assert_eq!(split_message("a\nb", MESSAGE_LIMIT), vec!["a\nb"]);
        assert_eq!(split_message("", MESSAGE_LIMIT), vec![""]);
    }

    #[test]
    fn test_split_on_line_boundaries_in_order() {
        let chunks = split_message("aaa\nbbb\nccc\nddd", 8);
        assert_eq!(chunks, vec!["aaa\nbbb", "ccc\nddd"]);
    }

    #[test]
    fn test_split_cuts_overlong_line() {
        let chunks = split_message("xy\nabcdefg\nz", 3);
        assert_eq!(chunks, vec!["xy", "abc", "def", "g", "z"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 3));
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let text = "é".repeat(5);
        assert_eq!(split_message(&text, 5), vec![text.clone()]);
    }

    #[test]
    fn test_empty_token_rejected() {
        let config = TelegramConfig::default();
        assert!(matches!(
            TelegramNotifier::new(&config),
            Err(NotifyError::Config(_))
        ));
    }
}
