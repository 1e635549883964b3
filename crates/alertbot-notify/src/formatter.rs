//! Rendering of alert notifications into chat messages.
//!
//! A [`MessageTemplate`] turns a list of alerts into HTML markup. [`fit_message`] then
//! makes the text safe to send: the chat transport rejects messages over
//! [`MESSAGE_LIMIT`] bytes, so long messages are cut at the last paragraph boundary
//! (the blank line the template puts between alerts) and never inside a tag.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::alert::{Alert, AlertStatus};
use crate::error::{NotifyError, Result};

/// Maximum message size accepted by the chat transport, in bytes.
pub const MESSAGE_LIMIT: usize = 4095;

/// Bytes reserved at the end of a truncated message for [`TRUNCATION_MARKER`].
pub const MARKER_RESERVE: usize = 15;

/// Appended to a truncated message.
pub const TRUNCATION_MARKER: &str = "\n<b>[SNIP]</b>";

/// Sent instead of a message that cannot be truncated safely.
pub const TOO_LONG_FALLBACK: &str = "message too long to send";

/// Sent instead of an empty rendering.
pub const EMPTY_FALLBACK: &str = "no alerts";

/// Name the template is registered under. The `.html` suffix turns on escaping.
const TEMPLATE_NAME: &str = "telegram.html";

/// The default template shipped with the bot.
pub const DEFAULT_TEMPLATE: &str = r#"{% for alert in alerts -%}
{% if alert.status == "firing" %}🔥{% else %}✅{% endif %} <b>{{ alert.labels.alertname | default(value="alert") }}</b> [{{ alert.status }}]
{% if alert.annotations.summary %}{{ alert.annotations.summary }}
{% endif %}{% if alert.starts_at %}<i>since {{ alert.starts_at }}</i>
{% endif %}{% for key, value in alert.labels %}{% if key != "alertname" %}<code>{{ key }}={{ value }}</code>
{% endif %}{% endfor %}
{% endfor %}"#;

/// Per-alert view handed to the template.
#[derive(Debug, Clone, Serialize)]
struct AlertView<'a> {
    status: AlertStatus,
    labels: &'a BTreeMap<String, String>,
    annotations: &'a BTreeMap<String, String>,
    starts_at: Option<String>,
    ends_at: Option<String>,
    generator_url: &'a str,
}

/// Data handed to the template.
#[derive(Debug, Clone, Serialize)]
struct TemplateData<'a> {
    receiver: &'a str,
    status: AlertStatus,
    alerts: Vec<AlertView<'a>>,
    common_labels: BTreeMap<String, String>,
    common_annotations: BTreeMap<String, String>,
    external_url: &'a str,
}

impl<'a> TemplateData<'a> {
    fn new(receiver: &'a str, alerts: &'a [Alert], external_url: &'a str, now: DateTime<Utc>) -> Self {
        let views: Vec<_> = alerts
            .iter()
            .map(|alert| AlertView {
                status: alert.status_at(now),
                labels: &alert.labels,
                annotations: &alert.annotations,
                starts_at: alert.starts_at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                ends_at: alert
                    .ends_at
                    .filter(|t| t.timestamp() > 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                generator_url: &alert.generator_url,
            })
            .collect();

        let status = if views.iter().any(|v| v.status == AlertStatus::Firing) {
            AlertStatus::Firing
        } else {
            AlertStatus::Resolved
        };

        Self {
            receiver,
            status,
            common_labels: common_pairs(alerts.iter().map(|a| &a.labels)),
            common_annotations: common_pairs(alerts.iter().map(|a| &a.annotations)),
            alerts: views,
            external_url,
        }
    }
}

/// Pairs present with the same value in every map.
fn common_pairs<'a>(
    mut maps: impl Iterator<Item = &'a BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let Some(first) = maps.next() else {
        return BTreeMap::new();
    };
    let mut common = first.clone();
    for map in maps {
        common.retain(|k, v| map.get(k) == Some(v));
    }
    common
}

/// A compiled notification template.
#[derive(Debug)]
pub struct MessageTemplate {
    tera: Tera,
    external_url: String,
}

impl MessageTemplate {
    /// Compiles a template from source text.
    ///
    /// `external_url` is exposed to the template as `external_url`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Template` if the source does not compile.
    pub fn from_source(source: &str, external_url: impl Into<String>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self {
            tera,
            external_url: external_url.into(),
        })
    }

    /// Reads and compiles a template file.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Template` if the file cannot be read or does not compile.
    pub fn from_file(path: impl AsRef<Path>, external_url: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| NotifyError::Template {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_source(&source, external_url)
    }

    /// Compiles [`DEFAULT_TEMPLATE`].
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Template` if the built-in template does not compile.
    pub fn builtin(external_url: impl Into<String>) -> Result<Self> {
        Self::from_source(DEFAULT_TEMPLATE, external_url)
    }

    /// Renders `alerts` for `receiver` as markup. Values are HTML-escaped.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Template` if rendering fails.
    pub fn render(&self, receiver: &str, alerts: &[Alert]) -> Result<String> {
        self.render_at(receiver, alerts, Utc::now())
    }

    fn render_at(&self, receiver: &str, alerts: &[Alert], now: DateTime<Utc>) -> Result<String> {
        let data = TemplateData::new(receiver, alerts, &self.external_url, now);
        let context = Context::from_serialize(&data)?;
        let text = self.tera.render(TEMPLATE_NAME, &context)?;
        debug!(receiver, alerts = alerts.len(), bytes = text.len(), "rendered message");
        Ok(text)
    }
}

/// Shortens `text` to at most `limit` bytes at a paragraph boundary.
///
/// Text within the limit is returned unchanged. Otherwise the last blank line inside
/// the first `limit - MARKER_RESERVE` bytes becomes the cut point and
/// [`TRUNCATION_MARKER`] is appended. Without a usable cut point the result is
/// [`TOO_LONG_FALLBACK`].
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }

    let window = &text.as_bytes()[..limit.saturating_sub(MARKER_RESERVE)];
    match window.windows(2).rposition(|pair| pair == b"\n\n") {
        // the cut lands on an ASCII newline, so it is a char boundary
        Some(i) if i > 1 => format!("{}{TRUNCATION_MARKER}", &text[..i]),
        _ => TOO_LONG_FALLBACK.to_string(),
    }
}

/// Escapes text for inclusion in an HTML message.
#[must_use]
pub fn escape_html(text: &str) -> String {
    tera::escape_html(text)
}

/// Prepares rendered text for sending: empty output becomes [`EMPTY_FALLBACK`], long
/// output is truncated to [`MESSAGE_LIMIT`].
#[must_use]
pub fn fit_message(text: &str) -> String {
    if text.trim().is_empty() {
        return EMPTY_FALLBACK.to_string();
    }
    truncate(text, MESSAGE_LIMIT)
}
