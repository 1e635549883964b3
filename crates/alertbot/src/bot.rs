//! Command and callback dispatcher.
//!
//! [`Bot`] is the context every handler runs against: it owns the mutation engine, the
//! per-chat list cursors, the rule-group sources and the chat transport. It is built
//! once at startup and shared behind an `Arc` by the poll loop and the HTTP server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alertbot_notify::{
    AlertmanagerClient, CursorMap, DEFAULT_PAGE_SIZE, MessageTemplate, NotifyError, Page,
    RuleGroups, WebhookMessage, escape_html, fit_message,
};
use alertbot_routing::{
    ConfigStore, Match, MutationEngine, Outcome, ReceiverId, Reloader, RoutingError,
};
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::error::{BotError, BotResult};
use crate::keyboard::{
    CallbackAction, GroupButton, NEXT_PAYLOAD, PREV_PAYLOAD, page_keyboard, page_title,
};
use crate::telegram::{ChatTransport, Incoming, TelegramClient};

/// Delay before polling again after a failed `getUpdates`.
pub const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Replies sent to chats.
pub mod replies {
    /// Reply to `/start` from a registered chat.
    pub const ALREADY_REGISTERED: &str = "You are already logged in.";
    /// Reply to `/stop`.
    pub const DISABLED: &str = "Alerting disabled. Use /start to register again.";
    /// Reply when a group subscription is refused because of a match-all route.
    pub const ALREADY_ALL: &str =
        "You are already subscribed for all alert groups. Unsubscribe first.";
    /// Reply to `/subscribeall`.
    pub const SUBSCRIBED_ALL: &str = "Subscribed to all alert groups.";
    /// Reply when the match-all route is revoked.
    pub const UNSUBSCRIBED_ALL: &str = "Subscription to all alert groups revoked.";
    /// Reply to `/unsubscribe` without subscriptions.
    pub const NO_SUBSCRIPTIONS: &str = "Active subscriptions not found";
    /// Reply to `/subscribe` when no rule groups are known.
    pub const NO_GROUPS: &str = "No alert groups found";
    /// Reply when a pressed button names a group that no longer exists.
    pub const GROUP_GONE: &str = "Alert group not found";
    /// Reply when a list button is pressed after the list was replaced.
    pub const LIST_OUTDATED: &str = "This list is outdated. Run the command again.";
    /// Reply to the chat after registration through the web flow.
    pub const REGISTERED: &str = "You are registered. Use /subscribe to pick alert groups.";
    /// Reply when the config was saved but not applied.
    pub const RELOAD_FAILED: &str =
        "Saved, but Alertmanager failed to reload. The change applies on the next reload.";
    /// Reply for every other failure.
    pub const FAILED: &str = "Something went wrong. Please try again later.";
}

/// Shared context of all handlers.
pub struct Bot<S, R, T> {
    engine: MutationEngine<S, R>,
    cursors: CursorMap<GroupButton>,
    rule_groups: RuleGroups,
    alertmanager: AlertmanagerClient,
    template: MessageTemplate,
    transport: T,
    public_url: String,
    page_size: usize,
}

impl<S, R, T> Bot<S, R, T>
where
    S: ConfigStore,
    R: Reloader,
    T: ChatTransport,
{
    /// Creates a bot without rule-group sources.
    #[must_use]
    pub fn new(
        engine: MutationEngine<S, R>,
        transport: T,
        alertmanager: AlertmanagerClient,
        template: MessageTemplate,
    ) -> Self {
        Self {
            engine,
            cursors: CursorMap::new(),
            rule_groups: RuleGroups::new(),
            alertmanager,
            template,
            transport,
            public_url: "http://localhost:8000".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the sources `/subscribe` lists groups from.
    #[must_use]
    pub fn with_rule_groups(mut self, rule_groups: RuleGroups) -> Self {
        self.rule_groups = rule_groups;
        self
    }

    /// Sets the base URL of registration links.
    #[must_use]
    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        self.public_url = public_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the number of entries per list page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the mutation engine.
    pub const fn engine(&self) -> &MutationEngine<S, R> {
        &self.engine
    }

    /// Returns the chat transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the open list cursors.
    pub const fn cursors(&self) -> &CursorMap<GroupButton> {
        &self.cursors
    }

    /// Handles one inbound event. Failures are logged and reported to the chat.
    pub async fn handle(&self, incoming: Incoming) {
        let (chat, result) = match incoming {
            Incoming::Command { chat, command } => {
                debug!(receiver = %chat, %command, "handling command");
                (chat, self.handle_command(chat, command).await)
            }
            Incoming::Callback {
                chat,
                message_id,
                callback_id,
                data,
            } => {
                debug!(receiver = %chat, message_id, "handling callback");
                let result = self
                    .handle_callback(chat, message_id, &callback_id, &data)
                    .await;
                (chat, result)
            }
        };

        let Err(err) = result else {
            return;
        };
        let reply = reply_for(&err);
        if reply == replies::FAILED {
            error!(receiver = %chat, error = %err, "failed to handle update");
        } else {
            debug!(receiver = %chat, error = %err, "update rejected");
        }
        if let Err(send_err) = self.transport.send_message(chat, reply, None).await {
            error!(receiver = %chat, error = %send_err, "failed to report error to chat");
        }
    }

    /// Executes a command typed in `chat`.
    ///
    /// # Errors
    ///
    /// Returns store, reload, alert listing or transport failures.
    pub async fn handle_command(&self, chat: ReceiverId, command: Command) -> BotResult<()> {
        if command == Command::Start {
            if self.engine.is_receiver_registered(chat).await? {
                return self.reply(chat, replies::ALREADY_REGISTERED).await;
            }
            return self.reply(chat, &self.auth_message(chat)).await;
        }

        if !self.ensure_registered(chat).await? {
            return Ok(());
        }

        match command {
            Command::Start => Ok(()),
            Command::Stop => {
                self.engine.disable_receiver(chat).await?;
                self.cursors.close(chat);
                self.reply(chat, replies::DISABLED).await
            }
            Command::Subscribe => self.offer_groups(chat).await,
            Command::SubscribeAll => {
                let outcome = self.engine.subscribe_all(chat).await?;
                self.reply(chat, outcome_reply(outcome, replies::SUBSCRIBED_ALL, replies::ALREADY_ALL))
                    .await
            }
            Command::Unsubscribe => self.offer_subscriptions(chat).await,
            Command::Alerts => self.list_alerts(chat).await,
        }
    }

    /// Executes a button press. The message holding the keyboard is always deleted.
    ///
    /// # Errors
    ///
    /// Returns store, reload or transport failures and stale list errors.
    pub async fn handle_callback(
        &self,
        chat: ReceiverId,
        message_id: i64,
        callback_id: &str,
        data: &str,
    ) -> BotResult<()> {
        if let Err(err) = self.transport.answer_callback(callback_id).await {
            warn!(receiver = %chat, error = %err, "failed to answer callback");
        }

        let result = self.apply_callback(chat, data).await;

        if let Err(err) = self.transport.delete_message(chat, message_id).await {
            warn!(receiver = %chat, message_id, error = %err, "failed to delete message");
        }
        result
    }

    async fn apply_callback(&self, chat: ReceiverId, data: &str) -> BotResult<()> {
        if !self.ensure_registered(chat).await? {
            return Ok(());
        }

        let Some((action, payload)) = CallbackAction::parse(data) else {
            debug!(receiver = %chat, data, "ignoring unknown callback");
            return Ok(());
        };

        match action {
            CallbackAction::Subscribe => {
                let Some(group) = self.rule_groups.find_by_prefix(payload).await else {
                    return self.reply(chat, replies::GROUP_GONE).await;
                };
                let outcome = self.engine.subscribe(chat, Match::group(&group)).await?;
                let group = escape_html(&group);
                let text = match outcome {
                    Outcome::Changed => format!("Subscribed to <b>{group}</b>."),
                    Outcome::Unchanged => format!("You are already subscribed to <b>{group}</b>."),
                };
                self.reply(chat, &text).await
            }
            CallbackAction::Unsubscribe => {
                let group = match self.engine.find_group_by_prefix(chat, payload).await {
                    Ok(group) => group,
                    Err(RoutingError::NotFound { .. }) => {
                        return self.reply(chat, replies::NO_SUBSCRIPTIONS).await;
                    }
                    Err(err) => return Err(err.into()),
                };
                self.engine.unsubscribe(chat, &Match::group(&group)).await?;
                let text = format!("Unsubscribed from <b>{}</b>.", escape_html(&group));
                self.reply(chat, &text).await
            }
            CallbackAction::Page => {
                let page = match payload {
                    NEXT_PAYLOAD => self.cursors.next(chat)?,
                    PREV_PAYLOAD => self.cursors.prev(chat)?,
                    other => {
                        debug!(receiver = %chat, payload = other, "ignoring unknown page move");
                        return Ok(());
                    }
                };
                self.send_page(chat, &page).await
            }
        }
    }

    /// Renders a webhook notification and sends it to the chat named by its receiver.
    ///
    /// # Errors
    ///
    /// Returns `BotError::InvalidRequest` if the receiver is not a chat id, or the
    /// rendering or transport failure.
    pub async fn deliver_webhook(&self, message: &WebhookMessage) -> BotResult<()> {
        let chat = message.receiver_id().ok_or_else(|| BotError::InvalidRequest {
            reason: format!("receiver {:?} is not a chat id", message.receiver),
        })?;

        let text = self.template.render(&message.receiver, &message.alerts)?;
        self.transport
            .send_message(chat, &fit_message(&text), None)
            .await?;
        info!(receiver = %chat, alerts = message.alerts.len(), "delivered notification");
        Ok(())
    }

    /// Registers `chat` and tells it so.
    ///
    /// # Errors
    ///
    /// Returns store or reload failures. A failed confirmation message is only logged.
    pub async fn register(&self, chat: ReceiverId) -> BotResult<Outcome> {
        let outcome = self.engine.register_receiver(chat).await?;
        if let Err(err) = self.transport.send_message(chat, replies::REGISTERED, None).await {
            warn!(receiver = %chat, error = %err, "failed to confirm registration");
        }
        Ok(outcome)
    }

    /// Returns true if `chat` is registered, otherwise sends it the registration link.
    async fn ensure_registered(&self, chat: ReceiverId) -> BotResult<bool> {
        if self.engine.is_receiver_registered(chat).await? {
            return Ok(true);
        }
        self.reply(chat, &self.auth_message(chat)).await?;
        Ok(false)
    }

    fn auth_message(&self, chat: ReceiverId) -> String {
        format!(
            "First you have to go auth <a href=\"{}/auth/simple?receiver={}\">flow</a>.",
            self.public_url,
            chat.get()
        )
    }

    async fn offer_groups(&self, chat: ReceiverId) -> BotResult<()> {
        if self.engine.is_subscribed(chat, &Match::all()).await? {
            return self.reply(chat, replies::ALREADY_ALL).await;
        }

        let names = self.rule_groups.group_names().await;
        if names.is_empty() {
            return self.reply(chat, replies::NO_GROUPS).await;
        }
        self.open_list(chat, CallbackAction::Subscribe, names).await
    }

    async fn offer_subscriptions(&self, chat: ReceiverId) -> BotResult<()> {
        if self.engine.is_subscribed(chat, &Match::all()).await? {
            self.engine.unsubscribe(chat, &Match::all()).await?;
            return self.reply(chat, replies::UNSUBSCRIBED_ALL).await;
        }

        let groups = self.engine.subscribed_groups(chat).await?;
        if groups.is_empty() {
            return self.reply(chat, replies::NO_SUBSCRIPTIONS).await;
        }
        self.open_list(chat, CallbackAction::Unsubscribe, groups).await
    }

    async fn open_list(
        &self,
        chat: ReceiverId,
        action: CallbackAction,
        names: Vec<String>,
    ) -> BotResult<()> {
        let items = names
            .into_iter()
            .map(|name| GroupButton::new(action, name))
            .collect();
        let page = self.cursors.open_list(chat, items, self.page_size);
        self.send_page(chat, &page).await
    }

    async fn send_page(&self, chat: ReceiverId, page: &Page<GroupButton>) -> BotResult<()> {
        let keyboard = page_keyboard(page);
        self.transport
            .send_message(chat, page_title(page), Some(&keyboard))
            .await?;
        Ok(())
    }

    async fn list_alerts(&self, chat: ReceiverId) -> BotResult<()> {
        let alerts = self.alertmanager.list_alerts(chat).await?;
        let text = self.template.render(&chat.name(), &alerts)?;
        self.reply(chat, &fit_message(&text)).await
    }

    async fn reply(&self, chat: ReceiverId, text: &str) -> BotResult<()> {
        self.transport.send_message(chat, text, None).await?;
        Ok(())
    }
}

impl<S, R, T> Bot<S, R, T>
where
    S: ConfigStore + 'static,
    R: Reloader + 'static,
    T: ChatTransport + 'static,
{
    /// Long-polls `client` for updates until `shutdown` resolves, handling each update
    /// on its own task.
    pub async fn run_polling(
        self: Arc<Self>,
        client: &TelegramClient,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);
        let mut offset = 0_i64;
        info!("polling for chat updates");

        loop {
            let updates = tokio::select! {
                () = &mut shutdown => break,
                updates = client.get_updates(offset) => updates,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(incoming) = update.into_incoming() else {
                            continue;
                        };
                        let bot = Arc::clone(&self);
                        tokio::spawn(async move { bot.handle(incoming).await });
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to fetch updates");
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }
        }

        info!("stopped polling");
    }
}

const fn outcome_reply(outcome: Outcome, changed: &'static str, unchanged: &'static str) -> &'static str {
    match outcome {
        Outcome::Changed => changed,
        Outcome::Unchanged => unchanged,
    }
}

/// Chat reply for a failed update.
#[must_use]
pub fn reply_for(err: &BotError) -> &'static str {
    match err {
        BotError::Routing(RoutingError::MatchAllActive { .. }) => replies::ALREADY_ALL,
        BotError::Routing(RoutingError::ReloadFailed { .. })
        | BotError::Notify(NotifyError::ReloadFailed { .. }) => replies::RELOAD_FAILED,
        BotError::Notify(NotifyError::NoCursor { .. }) => replies::LIST_OUTDATED,
        BotError::Notify(NotifyError::NoNextPage | NotifyError::NoPrevPage) => {
            replies::LIST_OUTDATED
        }
        _ => replies::FAILED,
    }
}
