//! Chat transport over the Telegram Bot API.
//!
//! [`ChatTransport`] is what the dispatcher needs from a chat service. [`TelegramClient`]
//! implements it and also long-polls for updates, which it converts into
//! [`Incoming`] events.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use alertbot_routing::{ReceiverId, Result as RoutingResult, RoutingError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::command::Command;

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    /// Button label.
    pub text: String,
    /// Data sent back when the button is pressed.
    pub callback_data: String,
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    /// Button rows, top to bottom.
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Iterates over all buttons row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// Outbound side of a chat service.
pub trait ChatTransport: Send + Sync {
    /// Sends an HTML message, optionally with an inline keyboard.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::TransportSendFailed` if the message was not accepted.
    fn send_message(
        &self,
        chat: ReceiverId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> impl Future<Output = RoutingResult<()>> + Send;

    /// Deletes a message.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::TransportSendFailed` if the call fails.
    fn delete_message(
        &self,
        chat: ReceiverId,
        message_id: i64,
    ) -> impl Future<Output = RoutingResult<()>> + Send;

    /// Acknowledges a button press.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::TransportSendFailed` if the call fails.
    fn answer_callback(&self, callback_id: &str) -> impl Future<Output = RoutingResult<()>> + Send;
}

/// An inbound event the dispatcher acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A bot command typed in a chat.
    Command {
        /// The chat the command came from.
        chat: ReceiverId,
        /// The parsed command.
        command: Command,
    },
    /// An inline keyboard button press.
    Callback {
        /// The chat holding the keyboard.
        chat: ReceiverId,
        /// The message carrying the keyboard.
        message_id: i64,
        /// Identifier to acknowledge.
        callback_id: String,
        /// The button's callback data.
        data: String,
    },
}

/// Telegram chat.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Chat id.
    pub id: i64,
}

/// Telegram message, reduced to the fields the bot reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within the chat.
    pub message_id: i64,
    /// The chat the message belongs to.
    pub chat: Chat,
    /// Text of the message.
    #[serde(default)]
    pub text: Option<String>,
}

/// Telegram callback query.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Query id.
    pub id: String,
    /// The message with the pressed button.
    #[serde(default)]
    pub message: Option<Message>,
    /// The button's callback data.
    #[serde(default)]
    pub data: Option<String>,
}

/// Telegram update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id.
    pub update_id: i64,
    /// A message in a private or group chat.
    #[serde(default)]
    pub message: Option<Message>,
    /// A message in a channel.
    #[serde(default)]
    pub channel_post: Option<Message>,
    /// A button press.
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Converts the update into an event, dropping anything the bot does not handle.
    #[must_use]
    pub fn into_incoming(self) -> Option<Incoming> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(Incoming::Callback {
                chat: ReceiverId::new(message.chat.id),
                message_id: message.message_id,
                callback_id: query.id,
                data: query.data.unwrap_or_default(),
            });
        }

        let message = self.message.or(self.channel_post)?;
        let command = Command::parse(message.text.as_deref()?)?;
        Some(Incoming::Command {
            chat: ReceiverId::new(message.chat.id),
            command,
        })
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Connection settings for the Bot API.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token.
    pub token: String,
    /// API base URL.
    pub api_url: String,
    /// Long-poll timeout of `getUpdates`.
    pub poll_timeout: Duration,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

/// Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::TransportSendFailed` if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> RoutingResult<Self> {
        // requests must outlive the long poll
        let http = Client::builder()
            .timeout(config.poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), config.token),
            poll_timeout: config.poll_timeout,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &serde_json::Value) -> RoutingResult<T> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(params)
            .send()
            .await
            .map_err(|e| transport_error(e.without_url()))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| transport_error(e.without_url()))?;

        match body {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(RoutingError::TransportSendFailed {
                reason: format!(
                    "{method}: {}",
                    description.unwrap_or_else(|| "request rejected".to_string())
                ),
            }),
        }
    }

    /// Long-polls for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::TransportSendFailed` if the call fails.
    pub async fn get_updates(&self, offset: i64) -> RoutingResult<Vec<Update>> {
        let params = json!({
            "offset": offset,
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message", "channel_post", "callback_query"],
        });
        self.call("getUpdates", &params).await
    }

    /// Publishes the command menu.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::TransportSendFailed` if the call fails.
    pub async fn set_my_commands(&self) -> RoutingResult<()> {
        let commands: Vec<_> = Command::ALL
            .iter()
            .map(|c| json!({ "command": c.name(), "description": c.description() }))
            .collect();
        let count = commands.len();
        let _: bool = self
            .call("setMyCommands", &json!({ "commands": commands }))
            .await?;
        debug!(commands = count, "published bot commands");
        Ok(())
    }
}

impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat: ReceiverId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> RoutingResult<()> {
        let mut params = json!({
            "chat_id": chat.get(),
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            params["reply_markup"] = serde_json::to_value(keyboard).map_err(transport_error)?;
        }
        let _: serde_json::Value = self.call("sendMessage", &params).await?;
        Ok(())
    }

    async fn delete_message(&self, chat: ReceiverId, message_id: i64) -> RoutingResult<()> {
        let params = json!({ "chat_id": chat.get(), "message_id": message_id });
        let _: bool = self.call("deleteMessage", &params).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> RoutingResult<()> {
        let params = json!({ "callback_query_id": callback_id });
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }
}

fn transport_error(err: impl fmt::Display) -> RoutingError {
    RoutingError::TransportSendFailed {
        reason: err.to_string(),
    }
}
