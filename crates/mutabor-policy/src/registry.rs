//! Named, ordered, duplicate-free collection of policies.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::policy::MutationPolicy;
use crate::result::REMOVE_COMMENTS_POLICY;

/// Configuration-class failures raised while shaping a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("distribution references unregistered policy '{0}'")]
    UnknownPolicy(String),

    #[error("negative weight {weight} for policy '{policy}'")]
    NegativeWeight { policy: String, weight: i64 },

    #[error("distribution must contain at least one positive weight")]
    AllZeroDistribution,
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registration-ordered policy collection.
///
/// Order matters: uniform selection, tie-breaks and the determinism
/// guarantee all follow registration order. Identity is the policy name;
/// registering a name twice is a no-op.
pub struct PolicyRegistry {
    name: String,
    policies: Vec<Box<dyn MutationPolicy>>,
    distribution: Option<BTreeMap<String, u64>>,
}

impl PolicyRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
            distribution: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a policy. Duplicate identities and the reserved comment-removal
    /// name are dropped with a log line, never an error.
    pub fn register(&mut self, policy: Box<dyn MutationPolicy>) {
        let name = policy.name();
        if name == REMOVE_COMMENTS_POLICY {
            warn!(policy = name, "policy name is reserved, not registering");
            return;
        }
        if self.policies.iter().any(|existing| existing.name() == name) {
            debug!(policy = name, "policy already registered, skipping");
            return;
        }
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Policy names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.policies.iter().map(|policy| policy.name()).collect()
    }

    /// Registered policies in registration order.
    pub fn policies(&self) -> impl Iterator<Item = &dyn MutationPolicy> {
        self.policies.iter().map(|policy| policy.as_ref())
    }

    pub fn policy(&self, index: usize) -> &dyn MutationPolicy {
        self.policies[index].as_ref()
    }

    pub fn policy_mut(&mut self, index: usize) -> &mut dyn MutationPolicy {
        self.policies[index].as_mut()
    }

    /// Replace uniform selection with explicit weights.
    ///
    /// Validation is all-or-nothing: an unknown policy key, a negative
    /// weight, or an all-zero map fails without touching the previous
    /// distribution. Policies absent from the map get weight zero.
    pub fn set_distribution(&mut self, weights: &BTreeMap<String, i64>) -> Result<()> {
        let mut validated = BTreeMap::new();
        let mut any_positive = false;
        for (policy, weight) in weights {
            if !self.policies.iter().any(|p| p.name() == policy.as_str()) {
                return Err(RegistryError::UnknownPolicy(policy.clone()));
            }
            if *weight < 0 {
                return Err(RegistryError::NegativeWeight {
                    policy: policy.clone(),
                    weight: *weight,
                });
            }
            if *weight > 0 {
                any_positive = true;
            }
            validated.insert(policy.clone(), *weight as u64);
        }
        if !any_positive {
            return Err(RegistryError::AllZeroDistribution);
        }
        self.distribution = Some(validated);
        Ok(())
    }

    pub fn distribution(&self) -> Option<&BTreeMap<String, u64>> {
        self.distribution.as_ref()
    }

    /// Reseed every registered policy with the same value, restoring the
    /// reproducibility of a fresh run.
    pub fn reseed_all(&mut self, seed: u64) {
        for policy in &mut self.policies {
            policy.reseed(seed);
        }
    }

    pub fn set_compile_check_all(&mut self, enabled: bool) {
        for policy in &mut self.policies {
            policy.set_compile_check(enabled);
        }
    }

    pub fn set_manage_use_headers_all(&mut self, enabled: bool) {
        for policy in &mut self.policies {
            policy.set_manage_use_headers(enabled);
        }
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("name", &self.name)
            .field("policies", &self.names())
            .field("distribution", &self.distribution)
            .finish()
    }
}
