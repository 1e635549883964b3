//! In-memory model of the Alertmanager routing configuration.
//!
//! This module provides the types this crate edits and the pure operations on them:
//! - [`ReceiverId`]: the numeric chat identity a receiver is keyed by
//! - [`Match`]: the optional label filter of a route
//! - [`Receiver`], [`Route`], [`RouteTree`]: the entries of the document
//! - [`ConfigDocument`]: the whole configuration, including sections this crate does not
//!   interpret, which are carried through unchanged
//!
//! # Invariants
//!
//! - At most one [`Receiver`] per id.
//! - No two routes share the same `(receiver, match)` pair.
//! - A receiver holds either one match-all route or any number of group-scoped routes,
//!   never both. [`ConfigDocument::add_route`] enforces this.
//!
//! Removal of receivers and routes moves the last entry into the freed slot, so the
//! order of the surviving entries is not stable.

use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use tracing::debug;

use crate::error::{Result, RoutingError};

/// The label used to scope a route to one alert group.
pub const ALERT_GROUP_LABEL: &str = "alertgroup";

/// Numeric chat identity of a receiver.
///
/// Receivers are stored in the document under the decimal form of this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(i64);

impl ReceiverId {
    /// Creates a receiver id from a chat id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the chat id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns the name this receiver is stored under.
    #[must_use]
    pub fn name(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReceiverId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for ReceiverId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Label filter of a route.
///
/// An empty filter matches every alert group ("match-all").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Match(BTreeMap<String, String>);

impl Match {
    /// The match-all filter.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter selecting a single alert group.
    #[must_use]
    pub fn group(name: impl Into<String>) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(ALERT_GROUP_LABEL.to_string(), name.into());
        Self(labels)
    }

    /// Returns true if this filter matches every alert group.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the alert group this filter is scoped to.
    #[must_use]
    pub fn alert_group(&self) -> Option<&str> {
        self.0.get(ALERT_GROUP_LABEL).map(String::as_str)
    }

    /// Returns the label pairs of this filter.
    #[must_use]
    pub const fn labels(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Returns true if a route carrying `candidate` is equivalent to this filter.
    ///
    /// A match-all filter is only equivalent to another match-all filter. Otherwise
    /// every pair of this filter must be present in `candidate`.
    #[must_use]
    pub fn selects(&self, candidate: &Self) -> bool {
        if self.is_all() {
            return candidate.is_all();
        }
        self.0
            .iter()
            .all(|(key, value)| candidate.0.get(key) == Some(value))
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "{{*}}");
        }
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={value:?}")?;
        }
        write!(f, "}}")
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Webhook notifier block of a receiver.
///
/// Fields left out of the source text stay absent when written back, so Alertmanager
/// keeps applying its own defaults to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Whether resolved alerts are delivered too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    /// Destination of the webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Notifier settings not interpreted here.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl WebhookConfig {
    /// Creates the notifier block injected into every registered receiver.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            send_resolved: Some(true),
            url: Some(url.into()),
            extra: Mapping::new(),
        }
    }
}

/// A named notification destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    /// Receiver name; the decimal chat id for receivers managed by this crate.
    pub name: String,
    /// Webhook notifiers of this receiver.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhook_configs: Vec<WebhookConfig>,
    /// Other notifier kinds and settings, carried through unchanged.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Receiver {
    /// Creates a receiver that notifies the given webhook.
    #[must_use]
    pub fn with_webhook(name: impl Into<String>, webhook_url: &str) -> Self {
        Self {
            name: name.into(),
            webhook_configs: vec![WebhookConfig::new(webhook_url)],
            extra: Mapping::new(),
        }
    }
}

/// A child route of the routing tree binding a receiver to a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Name of the receiver this route delivers to; inherited from the parent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Whether evaluation continues with the next sibling route.
    #[serde(rename = "continue", default, skip_serializing_if = "is_false")]
    pub continue_matching: bool,
    /// Label filter; empty means every alert group.
    #[serde(rename = "match", default, skip_serializing_if = "Match::is_all")]
    pub matcher: Match,
    /// Grouping, timing and nested routes, carried through unchanged.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Route {
    /// Creates a route for a receiver. Managed routes always continue.
    #[must_use]
    pub fn new(receiver: ReceiverId, matcher: Match) -> Self {
        Self {
            receiver: Some(receiver.name()),
            continue_matching: true,
            matcher,
            extra: Mapping::new(),
        }
    }

    fn belongs_to(&self, name: &str) -> bool {
        self.receiver.as_deref() == Some(name)
    }
}

/// The top-level route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTree {
    /// Default receiver, grouping and timing of the tree, carried through unchanged.
    #[serde(flatten)]
    pub extra: Mapping,
    /// Child routes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

/// The full routing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Global settings, templates, inhibition rules and any other section, carried
    /// through unchanged.
    #[serde(flatten)]
    pub extra: Mapping,
    /// The routing tree.
    #[serde(default)]
    pub route: RouteTree,
    /// All receivers.
    #[serde(default)]
    pub receivers: Vec<Receiver>,
}

impl ConfigDocument {
    /// Parses a document from its YAML form.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::MalformedConfig` if the text is not a valid document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(RoutingError::from)
    }

    /// Serializes the whole document back to YAML.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::MalformedConfig` if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(RoutingError::from)
    }

    /// Replaces the receivers and child routes of this document with those of `source`.
    ///
    /// Everything else in `self` is kept.
    #[must_use]
    pub fn with_routing_from(mut self, source: Self) -> Self {
        self.receivers = source.receivers;
        self.route.routes = source.route.routes;
        self
    }

    /// Returns the position of a receiver.
    #[must_use]
    pub fn find_receiver(&self, id: ReceiverId) -> Option<usize> {
        let name = id.name();
        self.receivers.iter().position(|r| r.name == name)
    }

    /// Returns the position of the route equivalent to `(id, matcher)`.
    #[must_use]
    pub fn find_route(&self, id: ReceiverId, matcher: &Match) -> Option<usize> {
        let name = id.name();
        self.route
            .routes
            .iter()
            .position(|r| r.belongs_to(&name) && matcher.selects(&r.matcher))
    }

    /// Inserts a receiver notifying `webhook_url`, or resets the notifier of an
    /// existing one.
    pub fn add_receiver(&mut self, id: ReceiverId, webhook_url: &str) {
        match self.find_receiver(id) {
            Some(pos) => {
                self.receivers[pos].webhook_configs = vec![WebhookConfig::new(webhook_url)];
            }
            None => self
                .receivers
                .push(Receiver::with_webhook(id.name(), webhook_url)),
        }
    }

    /// Removes a receiver. Returns false if it was not present.
    pub fn remove_receiver(&mut self, id: ReceiverId) -> bool {
        match self.find_receiver(id) {
            Some(pos) => {
                self.receivers.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Appends a route for `(id, matcher)`.
    ///
    /// A match-all route replaces every group-scoped route of the receiver.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::AlreadyExists` if an equivalent route is present, and
    /// `RoutingError::MatchAllActive` if `matcher` is group-scoped while the receiver
    /// holds a match-all route.
    pub fn add_route(&mut self, id: ReceiverId, matcher: Match) -> Result<()> {
        if self.find_route(id, &matcher).is_some() {
            return Err(RoutingError::AlreadyExists {
                what: format!("route {id} with match {matcher}"),
            });
        }

        if matcher.is_all() {
            let purged = self.remove_all_routes(id);
            if purged > 0 {
                debug!(receiver = %id, purged, "replaced group routes with match-all route");
            }
        } else if self.find_route(id, &Match::all()).is_some() {
            return Err(RoutingError::MatchAllActive { receiver: id.name() });
        }

        self.route.routes.push(Route::new(id, matcher));
        Ok(())
    }

    /// Removes the route equivalent to `(id, matcher)`.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::NotFound` if no equivalent route exists.
    pub fn remove_route(&mut self, id: ReceiverId, matcher: &Match) -> Result<()> {
        let pos = self
            .find_route(id, matcher)
            .ok_or_else(|| RoutingError::NotFound {
                what: format!("route {id} with match {matcher}"),
            })?;
        self.route.routes.swap_remove(pos);
        Ok(())
    }

    /// Removes every route of a receiver. Returns how many were removed.
    pub fn remove_all_routes(&mut self, id: ReceiverId) -> usize {
        let name = id.name();
        let before = self.route.routes.len();
        self.route.routes.retain(|r| !r.belongs_to(&name));
        before - self.route.routes.len()
    }

    /// Iterates over the routes of a receiver in document order.
    pub fn routes_for(&self, id: ReceiverId) -> impl Iterator<Item = &Route> {
        let name = id.name();
        self.route
            .routes
            .iter()
            .filter(move |r| r.belongs_to(&name))
    }

    /// Returns the alert groups a receiver is subscribed to, in document order.
    #[must_use]
    pub fn subscribed_groups(&self, id: ReceiverId) -> Vec<String> {
        self.routes_for(id)
            .filter_map(|r| r.matcher.alert_group())
            .map(str::to_string)
            .collect()
    }

    /// Returns the first subscribed alert group of a receiver starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::NotFound` if no subscribed group matches.
    pub fn find_group_by_prefix(&self, id: ReceiverId, prefix: &str) -> Result<String> {
        self.routes_for(id)
            .filter_map(|r| r.matcher.alert_group())
            .find(|group| group.starts_with(prefix))
            .map(str::to_string)
            .ok_or_else(|| RoutingError::NotFound {
                what: format!("alert group with prefix {prefix:?} for receiver {id}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const WEBHOOK: &str = "http://bot:8000/webhook";

    const SAMPLE: &str = r#"
global:
  resolve_timeout: 5m
route:
  receiver: blackhole
  group_by: [alertgroup]
  routes:
    - receiver: "1"
      continue: true
      match:
        alertgroup: node
    - receiver: ops
      matchers: ['severity="critical"']
      group_wait: 10s
receivers:
  - name: blackhole
  - name: ops
    email_configs:
      - to: ops@example.com
  - name: "1"
    webhook_configs:
      - send_resolved: true
        url: http://bot:8000/webhook
inhibit_rules:
  - source_match:
      severity: critical
    target_match:
      severity: warning
    equal: [alertname]
"#;

    fn id(n: i64) -> ReceiverId {
        ReceiverId::new(n)
    }

    fn doc_with_receivers(names: &[&str]) -> ConfigDocument {
        let mut doc = ConfigDocument::default();
        for name in names {
            doc.receivers.push(Receiver::with_webhook(*name, WEBHOOK));
        }
        doc
    }

    mod receiver_id_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("42", Some(42) ; "plain")]
        #[test_case(" -1001 ", Some(-1001) ; "negative group chat with spaces")]
        #[test_case("abc", None ; "not a number")]
        fn parse(input: &str, expected: Option<i64>) {
            let parsed = input.parse::<ReceiverId>().ok().map(ReceiverId::get);
            assert_eq!(parsed, expected);
        }

        #[test]
        fn name_is_decimal() {
            assert_eq!(id(-100_123).name(), "-100123");
            assert_eq!(id(7).to_string(), "7");
        }
    }

    mod match_tests {
        use super::*;

        #[test]
        fn match_all_only_selects_match_all() {
            assert!(Match::all().selects(&Match::all()));
            assert!(!Match::all().selects(&Match::group("node")));
        }

        #[test]
        fn group_selects_same_group() {
            assert!(Match::group("node").selects(&Match::group("node")));
            assert!(!Match::group("node").selects(&Match::group("disk")));
            assert!(!Match::group("node").selects(&Match::all()));
        }

        #[test]
        fn display() {
            assert_eq!(Match::all().to_string(), "{*}");
            assert_eq!(Match::group("node").to_string(), "{alertgroup=\"node\"}");
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn parses_managed_sections() {
            let doc = ConfigDocument::from_yaml(SAMPLE).unwrap();

            assert_eq!(doc.receivers.len(), 3);
            assert_eq!(doc.route.routes.len(), 2);
            assert_eq!(doc.find_receiver(id(1)), Some(2));
            assert_eq!(doc.find_route(id(1), &Match::group("node")), Some(0));
            assert!(doc.route.routes[0].continue_matching);
        }

        #[test]
        fn preserves_unmanaged_sections() {
            let doc = ConfigDocument::from_yaml(SAMPLE).unwrap();
            let text = doc.to_yaml().unwrap();
            let reparsed = ConfigDocument::from_yaml(&text).unwrap();

            assert_eq!(doc, reparsed);
            assert!(reparsed.extra.contains_key("global"));
            assert!(reparsed.extra.contains_key("inhibit_rules"));
            assert!(reparsed.route.extra.contains_key("group_by"));
            assert!(reparsed.route.routes[1].extra.contains_key("matchers"));
            assert!(reparsed.receivers[1].extra.contains_key("email_configs"));
        }

        const FOREIGN: &str = r"
route:
  receiver: ops
  routes:
    - match:
        severity: critical
      group_wait: 10s
receivers:
  - name: ops
    webhook_configs:
      - url: http://ops/hook
  - name: file
    webhook_configs:
      - url_file: /etc/hook-url
        max_alerts: 5
";

        fn as_value(text: &str) -> serde_yaml::Value {
            serde_yaml::from_str(text).unwrap()
        }

        #[test]
        fn foreign_entries_written_back_as_read() {
            let doc = ConfigDocument::from_yaml(FOREIGN).unwrap();
            let text = doc.to_yaml().unwrap();

            assert_eq!(as_value(&text), as_value(FOREIGN));
            assert!(!text.contains("send_resolved"));
            assert!(!text.contains("url: ''"));
            assert!(!text.contains("receiver: ''"));
        }

        #[test]
        fn foreign_entries_survive_mutation() {
            let mut doc = ConfigDocument::from_yaml(FOREIGN).unwrap();
            doc.add_receiver(id(7), WEBHOOK);
            doc.add_route(id(7), Match::group("node")).unwrap();
            let written = as_value(&doc.to_yaml().unwrap());
            let original = as_value(FOREIGN);

            assert_eq!(written["receivers"][0], original["receivers"][0]);
            assert_eq!(written["receivers"][1], original["receivers"][1]);
            assert_eq!(written["route"]["routes"][0], original["route"]["routes"][0]);
            assert_eq!(written["receivers"][2]["webhook_configs"][0]["send_resolved"], true);
        }

        #[test]
        fn route_without_receiver_belongs_to_nobody() {
            let doc = ConfigDocument::from_yaml(FOREIGN).unwrap();

            assert_eq!(doc.route.routes[0].receiver, None);
            assert_eq!(doc.routes_for(id(0)).count(), 0);
        }

        #[test]
        fn empty_text_is_empty_document() {
            let doc = ConfigDocument::from_yaml("  \n").unwrap();
            assert!(doc.receivers.is_empty());
            assert!(doc.route.routes.is_empty());
        }

        #[test]
        fn rejects_wrong_shape() {
            let err = ConfigDocument::from_yaml("receivers: 12").unwrap_err();
            assert!(matches!(err, RoutingError::MalformedConfig { .. }));
        }

        #[test]
        fn match_all_route_serializes_without_match() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(5), Match::all()).unwrap();
            let text = doc.to_yaml().unwrap();

            assert!(text.contains("continue: true"));
            assert!(!text.contains("match"));
        }

        #[test]
        fn merge_takes_routing_from_source() {
            let base = ConfigDocument::from_yaml(SAMPLE).unwrap();
            let mut source = ConfigDocument::default();
            source.add_receiver(id(9), WEBHOOK);
            source.add_route(id(9), Match::all()).unwrap();

            let merged = base.clone().with_routing_from(source);

            assert_eq!(merged.receivers.len(), 1);
            assert_eq!(merged.route.routes.len(), 1);
            assert_eq!(merged.extra, base.extra);
            assert_eq!(merged.route.extra, base.route.extra);
        }
    }

    mod receiver_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn add_receiver_inserts_webhook() {
            let mut doc = ConfigDocument::default();
            doc.add_receiver(id(1), WEBHOOK);

            assert_eq!(doc.receivers.len(), 1);
            assert_eq!(doc.receivers[0].name, "1");
            assert_eq!(doc.receivers[0].webhook_configs[0].url.as_deref(), Some(WEBHOOK));
            assert_eq!(doc.receivers[0].webhook_configs[0].send_resolved, Some(true));
        }

        #[test]
        fn add_receiver_is_upsert() {
            let mut doc = ConfigDocument::default();
            doc.add_receiver(id(1), "http://old/webhook");
            doc.add_receiver(id(1), WEBHOOK);

            assert_eq!(doc.receivers.len(), 1);
            assert_eq!(doc.receivers[0].webhook_configs.len(), 1);
            assert_eq!(doc.receivers[0].webhook_configs[0].url.as_deref(), Some(WEBHOOK));
        }

        #[test_case(&[], &[] ; "empty")]
        #[test_case(&["1"], &[] ; "single receiver")]
        #[test_case(&["1", "2"], &["2"] ; "two receivers")]
        #[test_case(&["2", "3"], &["2", "3"] ; "absent receiver")]
        fn remove_receiver(before: &[&str], after: &[&str]) {
            let mut doc = doc_with_receivers(before);
            doc.remove_receiver(id(1));

            let mut names: Vec<_> = doc.receivers.iter().map(|r| r.name.as_str()).collect();
            names.sort_unstable();
            assert_eq!(names, after);
        }

        #[test]
        fn remove_receiver_moves_last_into_slot() {
            let mut doc = doc_with_receivers(&["1", "2", "3"]);
            assert!(doc.remove_receiver(id(1)));

            let names: Vec<_> = doc.receivers.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, ["3", "2"]);
        }
    }

    mod route_tests {
        use super::*;

        #[test]
        fn add_duplicate_route_fails() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(1), Match::group("node")).unwrap();

            let err = doc.add_route(id(1), Match::group("node")).unwrap_err();
            assert!(matches!(err, RoutingError::AlreadyExists { .. }));
            assert_eq!(doc.route.routes.len(), 1);
        }

        #[test]
        fn add_match_all_purges_group_routes() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(1), Match::group("a")).unwrap();
            doc.add_route(id(1), Match::group("b")).unwrap();
            doc.add_route(id(2), Match::group("a")).unwrap();

            doc.add_route(id(1), Match::all()).unwrap();

            assert_eq!(doc.routes_for(id(1)).count(), 1);
            assert!(doc.find_route(id(1), &Match::all()).is_some());
            assert_eq!(doc.routes_for(id(2)).count(), 1);
        }

        #[test]
        fn add_group_route_rejected_while_match_all() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(1), Match::all()).unwrap();

            let err = doc.add_route(id(1), Match::group("a")).unwrap_err();
            assert!(matches!(err, RoutingError::MatchAllActive { .. }));
        }

        #[test]
        fn remove_missing_route_fails() {
            let mut doc = ConfigDocument::default();
            let err = doc.remove_route(id(1), &Match::group("a")).unwrap_err();
            assert!(matches!(err, RoutingError::NotFound { .. }));
        }

        #[test]
        fn remove_all_routes_leaves_other_receivers() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(1), Match::group("a")).unwrap();
            doc.add_route(id(2), Match::group("a")).unwrap();
            doc.add_route(id(1), Match::group("b")).unwrap();

            assert_eq!(doc.remove_all_routes(id(1)), 2);
            assert_eq!(doc.routes_for(id(1)).count(), 0);
            assert_eq!(doc.routes_for(id(2)).count(), 1);
            assert_eq!(doc.remove_all_routes(id(1)), 0);
        }

        #[test]
        fn find_group_by_prefix_first_match_wins() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(1), Match::group("kube-apiserver")).unwrap();
            doc.add_route(id(1), Match::group("kube-scheduler")).unwrap();
            doc.add_route(id(2), Match::group("kafka")).unwrap();

            assert_eq!(doc.find_group_by_prefix(id(1), "kube").unwrap(), "kube-apiserver");
            assert_eq!(doc.find_group_by_prefix(id(1), "kube-s").unwrap(), "kube-scheduler");
            assert!(doc.find_group_by_prefix(id(1), "kafka").is_err());
            assert!(doc.find_group_by_prefix(id(1), "Kube").is_err());
        }

        #[test]
        fn subscribed_groups_skip_match_all() {
            let mut doc = ConfigDocument::default();
            doc.add_route(id(1), Match::group("a")).unwrap();
            doc.add_route(id(1), Match::group("b")).unwrap();
            assert_eq!(doc.subscribed_groups(id(1)), ["a", "b"]);

            doc.add_route(id(1), Match::all()).unwrap();
            assert!(doc.subscribed_groups(id(1)).is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_subscribe_unsubscribe_restores_routes(
            group in "[a-z][a-z0-9-]{0,20}",
            others in proptest::collection::vec("[a-z]{1,8}", 0..6),
        ) {
            let mut doc = ConfigDocument::default();
            for other in &others {
                if *other != group {
                    let _ = doc.add_route(id(1), Match::group(other.clone()));
                }
            }
            let mut before = doc.route.routes.clone();

            doc.add_route(id(1), Match::group(group.clone())).unwrap();
            doc.remove_route(id(1), &Match::group(group)).unwrap();

            let mut after = doc.route.routes.clone();
            before.sort_by(|a, b| a.matcher.labels().cmp(b.matcher.labels()));
            after.sort_by(|a, b| a.matcher.labels().cmp(b.matcher.labels()));
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_at_most_one_receiver_per_id(ids in proptest::collection::vec(-5i64..5, 0..30)) {
            let mut doc = ConfigDocument::default();
            for n in &ids {
                doc.add_receiver(id(*n), WEBHOOK);
            }
            let mut names: Vec<_> = doc.receivers.iter().map(|r| r.name.clone()).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), total);
        }
    }
}
