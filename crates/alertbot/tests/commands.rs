//! Integration tests for bot commands.
//!
//! These tests verify:
//! 1. Unregistered chats get the registration link
//! 2. /stop removes the receiver and its routes
//! 3. /subscribeall and group subscriptions exclude each other
//! 4. /unsubscribe revokes the match-all route or lists group subscriptions
//! 5. /alerts renders the alerts routed to the chat

mod helpers;

use alertbot::{Command, replies};
use alertbot_routing::{Match, ReceiverId};
use helpers::{Harness, PUBLIC_URL, fake_alertmanager};
use serde_json::json;

const CHAT: i64 = 42;

fn id() -> ReceiverId {
    ReceiverId::new(CHAT)
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_start_sends_registration_link() {
    let harness = Harness::with_groups(&[]);

    harness.command(CHAT, Command::Start).await;

    let sent = harness.transport().last();
    assert_eq!(sent.chat, id());
    assert_eq!(
        sent.text,
        format!("First you have to go auth <a href=\"{PUBLIC_URL}/auth/simple?receiver=42\">flow</a>.")
    );
    assert_eq!(harness.store().writes(), 0);
}

#[tokio::test]
async fn test_start_when_registered() {
    let harness = Harness::registered(CHAT, &[]).await;

    harness.command(CHAT, Command::Start).await;

    assert_eq!(harness.transport().last().text, replies::ALREADY_REGISTERED);
}

#[tokio::test]
async fn test_commands_require_registration() {
    let harness = Harness::with_groups(&["node"]);

    for command in [
        Command::Stop,
        Command::Subscribe,
        Command::SubscribeAll,
        Command::Unsubscribe,
        Command::Alerts,
    ] {
        harness.command(CHAT, command).await;
        assert!(harness.transport().last().text.contains("/auth/simple?receiver=42"));
    }

    assert_eq!(harness.store().writes(), 0);
    assert_eq!(harness.reloads.count(), 0);
}

#[tokio::test]
async fn test_negative_chat_id_in_link() {
    let harness = Harness::with_groups(&[]);

    harness.command(-1001, Command::Start).await;

    assert!(harness.transport().last().text.contains("receiver=-1001"));
}

// ============================================================================
// Stop
// ============================================================================

#[tokio::test]
async fn test_stop_removes_receiver_and_routes() {
    let harness = Harness::registered(CHAT, &[]).await;
    let engine = harness.bot.engine();
    engine.subscribe(id(), Match::group("a")).await.unwrap();
    engine.subscribe(id(), Match::group("b")).await.unwrap();
    engine.register_receiver(ReceiverId::new(7)).await.unwrap();
    engine.subscribe(ReceiverId::new(7), Match::group("a")).await.unwrap();

    harness.command(CHAT, Command::Stop).await;

    assert_eq!(harness.transport().last().text, replies::DISABLED);
    assert!(!engine.is_receiver_registered(id()).await.unwrap());
    assert!(harness.groups_of(CHAT).await.is_empty());
    assert_eq!(harness.groups_of(7).await, vec!["a".to_string()]);
}

// ============================================================================
// Subscribe all
// ============================================================================

#[tokio::test]
async fn test_subscribe_all_replaces_group_routes() {
    let harness = Harness::registered(CHAT, &[]).await;
    let engine = harness.bot.engine();
    engine.subscribe(id(), Match::group("a")).await.unwrap();

    harness.command(CHAT, Command::SubscribeAll).await;

    assert_eq!(harness.transport().last().text, replies::SUBSCRIBED_ALL);
    assert!(engine.is_subscribed(id(), &Match::all()).await.unwrap());
    assert!(harness.groups_of(CHAT).await.is_empty());
}

#[tokio::test]
async fn test_subscribe_all_twice() {
    let harness = Harness::registered(CHAT, &[]).await;
    harness.command(CHAT, Command::SubscribeAll).await;
    let writes = harness.store().writes();

    harness.command(CHAT, Command::SubscribeAll).await;

    assert_eq!(harness.transport().last().text, replies::ALREADY_ALL);
    assert_eq!(harness.store().writes(), writes);
}

#[tokio::test]
async fn test_subscribe_refused_while_subscribed_to_all() {
    let harness = Harness::registered(CHAT, &["node", "disk"]).await;
    harness.command(CHAT, Command::SubscribeAll).await;

    harness.command(CHAT, Command::Subscribe).await;

    let sent = harness.transport().last();
    assert_eq!(sent.text, replies::ALREADY_ALL);
    assert!(sent.keyboard.is_none());
}

// ============================================================================
// Unsubscribe
// ============================================================================

#[tokio::test]
async fn test_unsubscribe_revokes_match_all() {
    let harness = Harness::registered(CHAT, &[]).await;
    harness.command(CHAT, Command::SubscribeAll).await;

    harness.command(CHAT, Command::Unsubscribe).await;

    assert_eq!(harness.transport().last().text, replies::UNSUBSCRIBED_ALL);
    assert!(!harness.bot.engine().is_subscribed(id(), &Match::all()).await.unwrap());
    assert!(harness.bot.engine().is_receiver_registered(id()).await.unwrap());
}

#[tokio::test]
async fn test_unsubscribe_without_subscriptions() {
    let harness = Harness::registered(CHAT, &[]).await;

    harness.command(CHAT, Command::Unsubscribe).await;

    assert_eq!(harness.transport().last().text, replies::NO_SUBSCRIPTIONS);
}

#[tokio::test]
async fn test_unsubscribe_lists_active_groups() {
    let harness = Harness::registered(CHAT, &[]).await;
    let engine = harness.bot.engine();
    engine.subscribe(id(), Match::group("disk")).await.unwrap();
    engine.subscribe(id(), Match::group("node")).await.unwrap();

    harness.command(CHAT, Command::Unsubscribe).await;

    let sent = harness.transport().last();
    assert_eq!(sent.text, "Active alert groups:");
    assert_eq!(sent.labels(), vec!["disk".to_string(), "node".to_string()]);
    assert_eq!(sent.callback("node"), "\u{c}/unsubscribe|node");
}

// ============================================================================
// Alerts
// ============================================================================

#[tokio::test]
async fn test_alerts_lists_alerts_of_chat() {
    let addr = fake_alertmanager(json!([
        { "labels": { "alertname": "DiskFull", "instance": "db-1" }, "receivers": ["42"] },
        { "labels": { "alertname": "NodeDown" }, "receivers": ["7"] },
    ]))
    .await;
    let harness = Harness::new("", &[], &format!("http://{addr}"));
    harness.bot.engine().register_receiver(id()).await.unwrap();

    harness.command(CHAT, Command::Alerts).await;

    let text = harness.transport().last().text;
    assert!(text.contains("<b>DiskFull</b>"));
    assert!(text.contains("<code>instance=db-1</code>"));
    assert!(!text.contains("NodeDown"));
}

#[tokio::test]
async fn test_alerts_without_alerts() {
    let addr = fake_alertmanager(json!([])).await;
    let harness = Harness::new("", &[], &format!("http://{addr}"));
    harness.bot.engine().register_receiver(id()).await.unwrap();

    harness.command(CHAT, Command::Alerts).await;

    assert_eq!(harness.transport().last().text, "no alerts");
}

#[tokio::test]
async fn test_alerts_with_unreachable_alertmanager() {
    let harness = Harness::registered(CHAT, &[]).await;

    harness.command(CHAT, Command::Alerts).await;

    assert_eq!(harness.transport().last().text, replies::FAILED);
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test]
async fn test_store_failure_is_reported() {
    let harness = Harness::registered(CHAT, &[]).await;
    harness.store().set_available(false);

    harness.command(CHAT, Command::SubscribeAll).await;

    assert_eq!(harness.transport().last().text, replies::FAILED);
}
