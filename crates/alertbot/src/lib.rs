//! Telegram bridge for Alertmanager.
//!
//! Chats register as Alertmanager receivers and subscribe to alert groups through bot
//! commands; Alertmanager notifies them back through the webhook endpoint.
//!
//! - [`Bot`]: command and callback dispatcher, the shared context of all handlers
//! - [`create_router`] / [`serve_with_shutdown`]: health, webhook and registration endpoints
//! - [`TelegramClient`]: Bot API transport and update long-polling
//! - [`Settings`]: process settings from flags and environment

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bot;
pub mod command;
pub mod error;
pub mod handlers;
pub mod keyboard;
pub mod routes;
pub mod server;
pub mod settings;
pub mod telegram;

#[cfg(test)]
mod testing;

pub use bot::{Bot, POLL_RETRY_DELAY, replies, reply_for};
pub use command::Command;
pub use error::{BotError, BotResult};
pub use keyboard::{CALLBACK_LIMIT, CallbackAction, GroupButton, page_keyboard, page_title};
pub use routes::create_router;
pub use server::serve_with_shutdown;
pub use settings::{LogFormat, Settings};
pub use telegram::{
    ChatTransport, InlineButton, InlineKeyboard, Incoming, TelegramClient, TelegramConfig, Update,
};
