//! Bot commands.

use std::fmt;

/// A command the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Register the chat as a receiver.
    Start,
    /// Remove the receiver and all of its routes.
    Stop,
    /// Pick an alert group to subscribe to.
    Subscribe,
    /// Subscribe to every alert group.
    SubscribeAll,
    /// Pick a subscription to revoke.
    Unsubscribe,
    /// List alerts currently firing for the chat.
    Alerts,
}

impl Command {
    /// All commands, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::Stop,
        Self::Subscribe,
        Self::SubscribeAll,
        Self::Unsubscribe,
        Self::Alerts,
    ];

    /// Command name without the leading slash.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Subscribe => "subscribe",
            Self::SubscribeAll => "subscribeall",
            Self::Unsubscribe => "unsubscribe",
            Self::Alerts => "alerts",
        }
    }

    /// Menu description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Register in alertmanager",
            Self::Stop => "Disable any alerting",
            Self::Subscribe => "Subscribe to some alert group",
            Self::SubscribeAll => "Subscribe to all alert groups",
            Self::Unsubscribe => "Revoke subscription",
            Self::Alerts => "List active alerts",
        }
    }

    /// Parses the command at the start of a message.
    ///
    /// Accepts an `@botname` suffix and trailing arguments, which are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().split_whitespace().next()?;
        let word = word.strip_prefix('/')?;
        let name = word.split_once('@').map_or(word, |(name, _)| name);
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}
