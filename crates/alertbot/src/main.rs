//! alertbot - Telegram bridge for Alertmanager
//!
//! Edits the Alertmanager config secret on behalf of chats and forwards webhook
//! notifications to them.

use std::sync::Arc;

use alertbot::{Bot, LogFormat, Settings, TelegramClient, serve_with_shutdown};
use alertbot_kube::{CustomRuleSource, RuleKind, SecretStore};
use alertbot_notify::{AlertmanagerClient, MessageTemplate, RuleGroups};
use alertbot_routing::{MutationEngine, RoutingError};
use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    init_tracing(&settings)?;
    settings.validate()?;

    run(settings).await
}

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .context("invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter);
    match settings.log_format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
    Ok(())
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    info!(
        namespace = %settings.kube_namespace,
        secret = %settings.dest_secret_name,
        alertmanager = %settings.alertmanager_url,
        "starting alertbot"
    );

    let kube = alertbot_kube::connect(&settings.kube_config()).await?;

    let mut store = SecretStore::new(kube.clone(), settings.destination_record());
    if let Some(manual) = settings.manual_record() {
        info!(manual = %manual, "merging manual base config");
        store = store.with_manual(manual);
    }

    let alertmanager = AlertmanagerClient::new(&settings.alertmanager_config())?;
    let engine = MutationEngine::new(store, alertmanager.clone(), settings.webhook_url.as_str());

    match engine.sync().await {
        Ok(()) => {}
        Err(err @ RoutingError::ReloadFailed { .. }) => {
            warn!(error = %err, "initial reload failed, continuing");
        }
        Err(err) => return Err(err).context("failed to synchronize routing config"),
    }

    let rule_groups = RuleKind::ALL
        .into_iter()
        .fold(RuleGroups::new(), |groups, kind| {
            groups.with_source(CustomRuleSource::new(kube.clone(), kind))
        });

    let template = MessageTemplate::from_file(&settings.templates_path, &settings.alertmanager_url)
        .with_context(|| format!("failed to load template {}", settings.templates_path.display()))?;

    let telegram = TelegramClient::new(&settings.telegram_config())?;
    if let Err(err) = telegram.set_my_commands().await {
        warn!(error = %err, "failed to publish bot commands");
    }

    let bot = Arc::new(
        Bot::new(engine, telegram.clone(), alertmanager, template)
            .with_rule_groups(rule_groups)
            .with_public_url(settings.public_base_url())
            .with_page_size(settings.page_size),
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(serve_with_shutdown(
        Arc::clone(&bot),
        settings.listen,
        wait_for_stop(stop_rx.clone()),
    ));

    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for shutdown signal");
        }
        info!("shutdown requested");
        let _ = stop_tx.send(true);
    });

    bot.run_polling(&telegram, wait_for_stop(stop_rx)).await;

    server
        .await
        .context("server task panicked")?
        .context("server failed")?;

    info!("alertbot stopped");
    Ok(())
}

async fn wait_for_stop(mut stop: watch::Receiver<bool>) {
    // a dropped sender also means stop
    let _ = stop.wait_for(|stopped| *stopped).await;
}
