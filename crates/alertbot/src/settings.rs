//! Process settings.
//!
//! Everything is read once at startup from flags, with environment fallbacks, and
//! handed to the components as plain config structs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use alertbot_kube::KubeConfig;
use alertbot_notify::AlertmanagerConfig;
use alertbot_routing::StoreRecord;
use clap::{Parser, ValueEnum};
use url::Url;

use crate::error::{BotError, BotResult};
use crate::telegram::TelegramConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Settings of the bot process.
#[derive(Debug, Clone, Parser)]
#[command(name = "alertbot")]
#[command(about = "Telegram bridge for Alertmanager")]
#[command(version)]
pub struct Settings {
    /// Telegram bot token
    #[arg(long = "bot.token", env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Telegram Bot API base URL
    #[arg(
        long = "telegram.api-url",
        env = "TELEGRAM_API_URL",
        default_value = "https://api.telegram.org"
    )]
    pub telegram_api_url: String,

    /// Namespace of the Alertmanager config secrets
    #[arg(long = "kube.namespace", env = "KUBE_NAMESPACE", default_value = "default")]
    pub kube_namespace: String,

    /// Kubernetes API URL; the kubeconfig or in-cluster config is used when unset
    #[arg(long = "kube.api-url", env = "KUBE_API_URL")]
    pub kube_api_url: Option<String>,

    /// Alertmanager base URL
    #[arg(
        long = "alertmanager.url",
        env = "ALERTMANAGER_URL",
        default_value = "http://localhost:9093"
    )]
    pub alertmanager_url: String,

    /// Secret the bot writes the Alertmanager config to
    #[arg(long = "alertmanager.dest-secret-name", env = "ALERTMANAGER_DEST_SECRET_NAME")]
    pub dest_secret_name: String,

    /// Secret holding the hand-maintained base config
    #[arg(
        long = "alertmanager.manual-secret-name",
        env = "ALERTMANAGER_MANUAL_SECRET_NAME"
    )]
    pub manual_secret_name: Option<String>,

    /// Webhook URL Alertmanager notifies receivers through
    #[arg(
        long = "bot.webhook-url",
        env = "BOT_WEBHOOK_URL",
        default_value = "http://bot:8000/webhook"
    )]
    pub webhook_url: String,

    /// Notification template file
    #[arg(
        long = "bot.templates-path",
        env = "BOT_TEMPLATES_PATH",
        default_value = "templates/default.tera"
    )]
    pub templates_path: PathBuf,

    /// Public base URL of this service, used in registration links
    #[arg(
        long = "bot.public-url",
        env = "BOT_PUBLIC_URL",
        default_value = "http://localhost:8000"
    )]
    pub public_url: String,

    /// Items per page in selection lists
    #[arg(long = "bot.page-size", env = "BOT_PAGE_SIZE", default_value_t = 10)]
    pub page_size: usize,

    /// Address of the HTTP server
    #[arg(long = "bot.listen", env = "BOT_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Log level directive
    #[arg(long = "log.level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format
    #[arg(long = "log.format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Settings {
    /// Checks values clap cannot check.
    ///
    /// # Errors
    ///
    /// Returns `BotError::InvalidSettings` for a malformed URL, an empty token or a zero
    /// page size.
    pub fn validate(&self) -> BotResult<()> {
        if self.bot_token.trim().is_empty() {
            return Err(BotError::InvalidSettings {
                reason: "bot.token must not be empty".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(BotError::InvalidSettings {
                reason: "bot.page-size must be at least 1".to_string(),
            });
        }

        let mut urls = vec![
            ("telegram.api-url", self.telegram_api_url.as_str()),
            ("alertmanager.url", self.alertmanager_url.as_str()),
            ("bot.webhook-url", self.webhook_url.as_str()),
            ("bot.public-url", self.public_url.as_str()),
        ];
        if let Some(api_url) = &self.kube_api_url {
            urls.push(("kube.api-url", api_url.as_str()));
        }
        for (flag, value) in urls {
            Url::parse(value).map_err(|e| BotError::InvalidSettings {
                reason: format!("{flag}: invalid url {value:?}: {e}"),
            })?;
        }
        Ok(())
    }

    /// The record the bot edits.
    #[must_use]
    pub fn destination_record(&self) -> StoreRecord {
        StoreRecord::new(&self.kube_namespace, &self.dest_secret_name)
    }

    /// The record holding the base config, if configured.
    #[must_use]
    pub fn manual_record(&self) -> Option<StoreRecord> {
        self.manual_secret_name
            .as_ref()
            .map(|name| StoreRecord::new(&self.kube_namespace, name))
    }

    /// Connection settings for the alert-routing engine.
    #[must_use]
    pub fn alertmanager_config(&self) -> AlertmanagerConfig {
        AlertmanagerConfig::new(&self.alertmanager_url)
    }

    /// Connection settings for the Kubernetes API.
    #[must_use]
    pub fn kube_config(&self) -> KubeConfig {
        let config = KubeConfig::new();
        match &self.kube_api_url {
            Some(api_url) => config.with_api_url(api_url),
            None => config,
        }
    }

    /// Connection settings for the Telegram Bot API.
    #[must_use]
    pub fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            token: self.bot_token.clone(),
            api_url: self.telegram_api_url.clone(),
            poll_timeout: Duration::from_secs(60),
        }
    }

    /// Public URL without a trailing slash.
    #[must_use]
    pub fn public_base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}
