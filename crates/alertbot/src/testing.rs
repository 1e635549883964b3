//! Test doubles for the dispatcher and HTTP handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alertbot_notify::{AlertmanagerClient, AlertmanagerConfig, MessageTemplate};
use alertbot_routing::{MemoryStore, MutationEngine, ReceiverId, Reloader, Result, RoutingError};
use parking_lot::Mutex;

use crate::bot::Bot;
use crate::telegram::{ChatTransport, InlineKeyboard};

pub(crate) type TestBot = Bot<MemoryStore, SharedReloader, RecordingTransport>;

#[derive(Debug, Clone)]
pub(crate) struct SentMessage {
    pub(crate) chat: ReceiverId,
    pub(crate) text: String,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    fail_sends: AtomicBool,
}

impl RecordingTransport {
    pub(crate) fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat: ReceiverId,
        text: &str,
        _keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(RoutingError::TransportSendFailed {
                reason: "chat not found".to_string(),
            });
        }
        self.sent.lock().push(SentMessage {
            chat,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, _chat: ReceiverId, _message_id: i64) -> Result<()> {
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct CountingReloader {
    calls: AtomicUsize,
}

impl CountingReloader {
    pub(crate) fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SharedReloader(pub(crate) Arc<CountingReloader>);

impl Reloader for SharedReloader {
    async fn reload(&self) -> Result<()> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn test_bot(config: &str) -> (Arc<TestBot>, Arc<CountingReloader>) {
    let reloads = Arc::new(CountingReloader::default());
    let engine = MutationEngine::new(
        MemoryStore::new(config),
        SharedReloader(Arc::clone(&reloads)),
        "http://bot:8000/webhook",
    );
    let alertmanager = AlertmanagerClient::new(&AlertmanagerConfig::new("http://127.0.0.1:9")).unwrap();
    let template = MessageTemplate::builtin("http://alertmanager:9093").unwrap();
    let bot = Bot::new(engine, RecordingTransport::default(), alertmanager, template)
        .with_public_url("https://bot.example.org");
    (Arc::new(bot), reloads)
}
