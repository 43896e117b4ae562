//! Transformation results: the provenance records the manifest persists.

use std::collections::BTreeSet;

use mutabor_tree::Subtree;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Reserved policy name tagging the engine's comment-removal pass in the
/// manifest. Not registrable as a real policy.
pub const REMOVE_COMMENTS_POLICY: &str = "RemoveComments";

/// Outcome of one `apply` call.
///
/// `Empty` signals "nothing applicable" — unmet requirements, no candidate
/// location, or a reverted compile-check failure. It carries no provenance
/// and is silently dropped by the manifest sink. Results are immutable once
/// produced; identity is structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformationResult {
    Empty,
    Applied(AppliedTransformation),
}

impl TransformationResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransformationResult::Applied(_))
    }

    pub fn as_applied(&self) -> Option<&AppliedTransformation> {
        match self {
            TransformationResult::Applied(applied) => Some(applied),
            TransformationResult::Empty => None,
        }
    }
}

/// Provenance of one applied mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransformation {
    /// Name of the policy that produced the mutation.
    pub policy: String,
    /// Name of the unit the mutated element belongs to.
    pub unit: String,
    /// Name of the mutated element (function, or the unit itself for
    /// unit-level mutations).
    pub element: String,
    /// Independent pre-mutation snapshot of the mutated element.
    pub snapshot: Subtree,
    /// Category labels of the producing policy.
    pub categories: BTreeSet<Category>,
    /// Before/after detail, populated only in debug mode.
    pub debug: Option<DebugDetail>,
}

/// Optional debugging payload of an applied mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugDetail {
    /// Pretty-printed element before the mutation.
    pub before: String,
    /// Pretty-printed element after the mutation.
    pub after: String,
    /// Snapshot of the enclosing scope at mutation time.
    pub scope_snapshot: Subtree,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutabor_tree::SyntaxKind;

    fn sample(policy: &str) -> AppliedTransformation {
        AppliedTransformation {
            policy: policy.to_string(),
            unit: "Greeter".to_string(),
            element: "greet".to_string(),
            snapshot: Subtree::leaf(SyntaxKind::Function, "greet"),
            categories: BTreeSet::from([Category::Structure]),
            debug: None,
        }
    }

    #[test]
    fn identity_is_structural() {
        let a = TransformationResult::Applied(sample("TrueBranch"));
        let b = TransformationResult::Applied(sample("TrueBranch"));
        let c = TransformationResult::Applied(sample("FalseBranchElse"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn empty_carries_nothing() {
        let empty = TransformationResult::Empty;
        assert!(!empty.is_applied());
        assert!(empty.as_applied().is_none());
    }
}
