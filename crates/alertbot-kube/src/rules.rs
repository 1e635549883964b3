//! Alert-group discovery from rule custom resources.
//!
//! Both the Prometheus operator (`PrometheusRule`) and the VictoriaMetrics operator
//! (`VMRule`) define alerting rules in named groups. Every group name is a selectable
//! alert group. Resources are listed across all namespaces.

use std::fmt;

use alertbot_notify::{GroupNamesFuture, NotifyError, RuleGroupSource};
use kube::Client;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use serde::Deserialize;

use crate::error::KubeError;

/// A rule custom resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// `monitoring.coreos.com/v1` `PrometheusRule`.
    PrometheusRule,
    /// `operator.victoriametrics.com/v1beta1` `VMRule`.
    VmRule,
}

impl RuleKind {
    /// All supported kinds.
    pub const ALL: [Self; 2] = [Self::PrometheusRule, Self::VmRule];

    /// Kind name as used by the API.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PrometheusRule => "PrometheusRule",
            Self::VmRule => "VMRule",
        }
    }

    /// Group, version and kind of the resource.
    #[must_use]
    pub fn gvk(self) -> GroupVersionKind {
        match self {
            Self::PrometheusRule => GroupVersionKind::gvk("monitoring.coreos.com", "v1", self.name()),
            Self::VmRule => {
                GroupVersionKind::gvk("operator.victoriametrics.com", "v1beta1", self.name())
            }
        }
    }

    /// API resource description used for dynamic listing.
    #[must_use]
    pub fn api_resource(self) -> ApiResource {
        ApiResource::from_gvk(&self.gvk())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RuleSpec {
    #[serde(default)]
    groups: Vec<RuleGroup>,
}

#[derive(Debug, Deserialize)]
struct RuleGroup {
    name: String,
}

fn group_names(object: &DynamicObject) -> Result<Vec<String>, serde_json::Error> {
    let Some(spec) = object.data.get("spec") else {
        return Ok(Vec::new());
    };
    let spec = RuleSpec::deserialize(spec)?;
    Ok(spec.groups.into_iter().map(|group| group.name).collect())
}

/// Lists the group names of one rule kind.
#[derive(Clone)]
pub struct CustomRuleSource {
    client: Client,
    kind: RuleKind,
}

impl fmt::Debug for CustomRuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRuleSource")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl CustomRuleSource {
    /// Creates a source for `kind`.
    #[must_use]
    pub const fn new(client: Client, kind: RuleKind) -> Self {
        Self { client, kind }
    }

    fn source_error(&self, reason: impl fmt::Display) -> NotifyError {
        NotifyError::RuleSource {
            kind: self.kind.name().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl RuleGroupSource for CustomRuleSource {
    fn kind(&self) -> &str {
        self.kind.name()
    }

    fn list_group_names(&self) -> GroupNamesFuture<'_> {
        Box::pin(async move {
            let api: Api<DynamicObject> =
                Api::all_with(self.client.clone(), &self.kind.api_resource());
            let list = api
                .list(&ListParams::default())
                .await
                .map_err(|e| self.source_error(KubeError::from_client(self.kind.name(), e)))?;

            let mut names = Vec::new();
            for object in &list.items {
                names.extend(group_names(object).map_err(|e| self.source_error(e))?);
            }
            Ok(names)
        })
    }
}
