//! Error types for composition, contracts and configuration
//!
//! Composition errors are raised while enhancers are being built and applied,
//! before any instance exists. Runtime failures inside a component's own
//! behaviour are plain `anyhow::Error`s and pass through containers untouched.

use crate::props::PropKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or applying enhancers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// An input does not satisfy the unary component-transformation contract
    #[error("enhancer '{enhancer}' is not a unary component transformation: {reason}")]
    TypeConstraint { enhancer: String, reason: String },

    /// An enhancer handed back the exact component it was given
    #[error("enhancer '{enhancer}' returned the component it was given instead of a new one")]
    MutationViolation { enhancer: String },
}

impl ComposeError {
    pub fn type_constraint(enhancer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeConstraint {
            enhancer: enhancer.into(),
            reason: reason.into(),
        }
    }

    pub fn mutation(enhancer: impl Into<String>) -> Self {
        Self::MutationViolation {
            enhancer: enhancer.into(),
        }
    }
}

/// Props handed to a component do not match its declared contract
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("component '{component}' requires prop '{prop}'")]
    Missing { component: String, prop: String },

    #[error("component '{component}' expects prop '{prop}' to be {expected}, got {actual}")]
    Mismatch {
        component: String,
        prop: String,
        expected: PropKind,
        actual: PropKind,
    },
}

/// Configuration file could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Non-fatal diagnostic: a subscription outlived its owner's unmount
///
/// Emitted as a `warn` event on the `enhancer::leak` target whenever a
/// [`Subscription`](crate::source::Subscription) guard is dropped without
/// having been cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionLeakWarning {
    /// Display name of the layer that owned the subscription
    pub owner: String,
    /// Raw id of the leaked subscription
    pub subscription: u64,
}

impl SubscriptionLeakWarning {
    /// Tracing target leak warnings are emitted on
    pub const TARGET: &'static str = "enhancer::leak";

    pub(crate) fn emit(&self) {
        tracing::warn!(
            target: "enhancer::leak",
            owner = %self.owner,
            subscription = self.subscription,
            "SubscriptionLeakWarning: {} dropped subscription #{} without unmount",
            self.owner,
            self.subscription
        );
    }
}
