//! Test helpers for dispatcher integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use alertbot::{Bot, ChatTransport, Command, InlineKeyboard, Incoming};
use alertbot_notify::{AlertmanagerClient, AlertmanagerConfig, MessageTemplate, RuleGroups, StaticRuleGroups};
use alertbot_routing::{MemoryStore, MutationEngine, ReceiverId, Reloader, Result};
use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Webhook URL injected into receivers.
pub const WEBHOOK: &str = "http://bot:8000/webhook";

/// Public URL used in registration links.
pub const PUBLIC_URL: &str = "https://bot.example.org";

/// Bot wired to in-memory doubles.
pub type TestBot = Bot<MemoryStore, SharedReloader, RecordingTransport>;

/// A message the bot sent.
#[derive(Debug, Clone)]
pub struct Sent {
    pub chat: ReceiverId,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl Sent {
    /// Button labels, row by row.
    pub fn labels(&self) -> Vec<String> {
        self.keyboard
            .iter()
            .flat_map(InlineKeyboard::buttons)
            .map(|b| b.text.clone())
            .collect()
    }

    /// Callback data of the button with the given label.
    pub fn callback(&self, label: &str) -> String {
        self.keyboard
            .iter()
            .flat_map(InlineKeyboard::buttons)
            .find(|b| b.text == label)
            .map(|b| b.callback_data.clone())
            .unwrap()
    }
}

/// Chat transport recording every call.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<(ReceiverId, i64)>>,
    answered: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Sent {
        self.sent.lock().last().cloned().unwrap()
    }

    pub fn deleted(&self) -> Vec<(ReceiverId, i64)> {
        self.deleted.lock().clone()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat: ReceiverId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.sent.lock().push(Sent {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat: ReceiverId, message_id: i64) -> Result<()> {
        self.deleted.lock().push((chat, message_id));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.answered.lock().push(callback_id.to_string());
        Ok(())
    }
}

/// Reloader counting its calls.
#[derive(Debug, Default)]
pub struct CountingReloader {
    calls: AtomicUsize,
}

impl CountingReloader {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Shared handle to a [`CountingReloader`] (local newtype for the orphan rule).
#[derive(Debug, Clone)]
pub struct SharedReloader(pub Arc<CountingReloader>);

impl Reloader for SharedReloader {
    async fn reload(&self) -> Result<()> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A bot under test together with its doubles.
pub struct Harness {
    pub bot: Arc<TestBot>,
    pub reloads: Arc<CountingReloader>,
}

impl Harness {
    /// Bot over `config` offering `groups`, listing alerts from `alertmanager_url`.
    pub fn new(config: &str, groups: &[&str], alertmanager_url: &str) -> Self {
        let reloads = Arc::new(CountingReloader::default());
        let engine = MutationEngine::new(MemoryStore::new(config), SharedReloader(Arc::clone(&reloads)), WEBHOOK);
        let alertmanager = AlertmanagerClient::new(&AlertmanagerConfig::new(alertmanager_url)).unwrap();
        let template = MessageTemplate::builtin("http://alertmanager:9093").unwrap();
        let rule_groups = RuleGroups::new().with_source(StaticRuleGroups::new(groups.iter().copied()));

        let bot = Bot::new(engine, RecordingTransport::default(), alertmanager, template)
            .with_rule_groups(rule_groups)
            .with_public_url(PUBLIC_URL)
            .with_page_size(10);

        Self {
            bot: Arc::new(bot),
            reloads,
        }
    }

    /// Bot offering `groups` with an unreachable Alertmanager.
    pub fn with_groups(groups: &[&str]) -> Self {
        Self::new("", groups, "http://127.0.0.1:9")
    }

    /// Bot whose chat `chat` is already registered.
    pub async fn registered(chat: i64, groups: &[&str]) -> Self {
        let harness = Self::with_groups(groups);
        harness
            .bot
            .engine()
            .register_receiver(ReceiverId::new(chat))
            .await
            .unwrap();
        harness
    }

    pub fn transport(&self) -> &RecordingTransport {
        self.bot.transport()
    }

    pub fn store(&self) -> &MemoryStore {
        self.bot.engine().store()
    }

    pub async fn command(&self, chat: i64, command: Command) {
        self.bot
            .handle(Incoming::Command {
                chat: ReceiverId::new(chat),
                command,
            })
            .await;
    }

    pub async fn press(&self, chat: i64, message_id: i64, data: &str) {
        self.bot
            .handle(Incoming::Callback {
                chat: ReceiverId::new(chat),
                message_id,
                callback_id: format!("cb-{message_id}"),
                data: data.to_string(),
            })
            .await;
    }

    pub async fn groups_of(&self, chat: i64) -> Vec<String> {
        self.bot
            .engine()
            .subscribed_groups(ReceiverId::new(chat))
            .await
            .unwrap()
    }
}

/// Starts a fake Alertmanager serving `alerts` from its v1 listing.
pub async fn fake_alertmanager(alerts: Value) -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/v1/alerts",
            get(move || {
                let alerts = alerts.clone();
                async move { Json(json!({ "status": "success", "data": alerts })) }
            }),
        )
        .route("/-/reload", post(|| async { "" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// `count` group names `group-00`, `group-01`, ...
pub fn group_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("group-{i:02}")).collect()
}
