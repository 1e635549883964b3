//! Inline keyboards for alert-group selection lists.
//!
//! Every button carries callback data of the form `"\f<action>|<payload>"`. The chat
//! service limits callback data to [`CALLBACK_LIMIT`] bytes, so group names are cut to
//! fit and resolved back by prefix when the button is pressed.

use alertbot_notify::Page;

use crate::telegram::{InlineButton, InlineKeyboard};

/// Maximum callback data size accepted by the chat service, in bytes.
pub const CALLBACK_LIMIT: usize = 64;

const CALLBACK_PREFIX: char = '\u{c}';

/// Label of the button leading to the previous page.
pub const PREV_LABEL: &str = "< Prev";
/// Label of the button leading to the next page.
pub const NEXT_LABEL: &str = "Next >";
/// Payload of the previous-page button.
pub const PREV_PAYLOAD: &str = "prev";
/// Payload of the next-page button.
pub const NEXT_PAYLOAD: &str = "next";

/// What a button press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackAction {
    /// Subscribe to the named group.
    Subscribe,
    /// Revoke the subscription to the named group.
    Unsubscribe,
    /// Move through the open list.
    Page,
}

impl CallbackAction {
    const ALL: [Self; 3] = [Self::Subscribe, Self::Unsubscribe, Self::Page];

    /// Unique tag of the action inside callback data.
    #[must_use]
    pub const fn unique(self) -> &'static str {
        match self {
            Self::Subscribe => "/subscribe",
            Self::Unsubscribe => "/unsubscribe",
            Self::Page => "/page",
        }
    }

    /// Title of a selection list offering this action.
    #[must_use]
    pub const fn list_title(self) -> &'static str {
        match self {
            Self::Subscribe => "Available alert groups:",
            Self::Unsubscribe | Self::Page => "Active alert groups:",
        }
    }

    /// Longest payload that still fits into callback data, in bytes.
    #[must_use]
    pub const fn payload_limit(self) -> usize {
        // prefix char, unique tag and separator
        CALLBACK_LIMIT - 1 - self.unique().len() - 1
    }

    /// Builds callback data, cutting `payload` at a char boundary to fit.
    #[must_use]
    pub fn encode(self, payload: &str) -> String {
        let payload = cut(payload, self.payload_limit());
        format!("{CALLBACK_PREFIX}{}|{payload}", self.unique())
    }

    /// Splits callback data into its action and payload.
    #[must_use]
    pub fn parse(data: &str) -> Option<(Self, &str)> {
        let rest = data.strip_prefix(CALLBACK_PREFIX)?;
        let (unique, payload) = rest.split_once('|')?;
        let action = Self::ALL.into_iter().find(|a| a.unique() == unique)?;
        Some((action, payload))
    }
}

fn cut(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// One entry of a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupButton {
    /// Action taken when the entry is picked.
    pub action: CallbackAction,
    /// Full alert group name.
    pub name: String,
}

impl GroupButton {
    /// Creates an entry.
    pub fn new(action: CallbackAction, name: impl Into<String>) -> Self {
        Self {
            action,
            name: name.into(),
        }
    }

    fn to_button(&self) -> InlineButton {
        InlineButton {
            text: self.name.clone(),
            callback_data: self.action.encode(&self.name),
        }
    }
}

/// Builds a keyboard with one row per entry and a navigation row when needed.
#[must_use]
pub fn page_keyboard(page: &Page<GroupButton>) -> InlineKeyboard {
    let mut rows: Vec<Vec<InlineButton>> = page
        .items
        .iter()
        .map(|item| vec![item.to_button()])
        .collect();

    let mut nav = Vec::new();
    if page.has_prev {
        nav.push(InlineButton {
            text: PREV_LABEL.to_string(),
            callback_data: CallbackAction::Page.encode(PREV_PAYLOAD),
        });
    }
    if page.has_next {
        nav.push(InlineButton {
            text: NEXT_LABEL.to_string(),
            callback_data: CallbackAction::Page.encode(NEXT_PAYLOAD),
        });
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    InlineKeyboard { rows }
}

/// Title of the list a page belongs to.
#[must_use]
pub fn page_title(page: &Page<GroupButton>) -> &'static str {
    page.items
        .first()
        .map_or(CallbackAction::Subscribe.list_title(), |item| item.action.list_title())
}
