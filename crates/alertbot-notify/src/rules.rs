//! Discovery of alert-group names.
//!
//! Several rule-definition kinds can contribute alert groups. Each kind implements
//! [`RuleGroupSource`]; [`RuleGroups`] queries all of them and exposes only the merged,
//! de-duplicated list.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::Result;

/// Boxed future returned by [`RuleGroupSource::list_group_names`].
pub type GroupNamesFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

/// A kind of rule definition that contributes alert-group names.
pub trait RuleGroupSource: Send + Sync + fmt::Debug {
    /// Short name of the source kind, used in logs.
    fn kind(&self) -> &str;

    /// Lists the group names this source defines, in source order.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::RuleSource` if the source cannot be listed.
    fn list_group_names(&self) -> GroupNamesFuture<'_>;
}

/// A fixed list of group names.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleGroups {
    names: Vec<String>,
}

impl StaticRuleGroups {
    /// Creates a source returning `names`.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl RuleGroupSource for StaticRuleGroups {
    fn kind(&self) -> &str {
        "static"
    }

    fn list_group_names(&self) -> GroupNamesFuture<'_> {
        Box::pin(async move { Ok(self.names.clone()) })
    }
}

/// The union of all configured rule-group sources.
#[derive(Debug, Default)]
pub struct RuleGroups {
    sources: Vec<Box<dyn RuleGroupSource>>,
}

impl RuleGroups {
    /// Creates an empty set of sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source.
    #[must_use]
    pub fn with_source(mut self, source: impl RuleGroupSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of configured sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no source is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Lists the group names of every source, first occurrence wins.
    ///
    /// A source that fails is logged and contributes nothing.
    pub async fn group_names(&self) -> Vec<String> {
        let results = join_all(self.sources.iter().map(|s| s.list_group_names())).await;

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(listed) => {
                    debug!(kind = source.kind(), groups = listed.len(), "listed rule groups");
                    names.extend(listed.into_iter().filter(|n| seen.insert(n.clone())));
                }
                Err(err) => {
                    warn!(kind = source.kind(), error = %err, "failed to list rule groups");
                }
            }
        }
        names
    }

    /// Returns the first group name starting with `prefix`.
    pub async fn find_by_prefix(&self, prefix: &str) -> Option<String> {
        self.group_names()
            .await
            .into_iter()
            .find(|name| name.starts_with(prefix))
    }
}
