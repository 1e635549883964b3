//! Kubernetes integration for the alertbot chat bridge.
//!
//! - [`SecretStore`]: a [`ConfigStore`](alertbot_routing::ConfigStore) over Secrets, with
//!   optimistic concurrency through `resourceVersion` and an optional manual base config
//! - [`CustomRuleSource`]: alert-group names from `PrometheusRule` and `VMRule` resources
//! - [`connect`]: builds the shared [`kube::Client`] both run on

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod error;
pub mod rules;
pub mod secret;

#[cfg(test)]
mod testing;

pub use client::{KubeConfig, connect};
pub use error::{KubeError, Result};
pub use rules::{CustomRuleSource, RuleKind};
pub use secret::{SecretStore, secret_value};
