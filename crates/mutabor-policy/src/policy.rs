//! The mutation policy contract.

use std::collections::BTreeSet;

use mutabor_tree::{AstProvider, Corpus, NodeId, Subtree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::category::Category;
use crate::result::{AppliedTransformation, DebugDetail, TransformationResult};

/// An applicability predicate evaluated against a candidate scope before a
/// policy attempts anything.
pub type Requirement = fn(&Corpus, NodeId) -> bool;

/// Environment handed to a policy for one `apply` call.
pub struct ApplyEnv<'a> {
    /// The language tooling used for compile checks, use-header refresh and
    /// debug diffs.
    pub provider: &'a dyn AstProvider,
    /// When enabled, applied results carry before/after detail.
    pub debug: bool,
}

/// Shared per-policy state: the private random stream and the toggles every
/// policy honors.
pub struct PolicyCore {
    rng: StdRng,
    /// Validate the surrounding unit after mutating; revert on failure.
    pub compile_check: bool,
    /// Recompute the unit's use headers after mutating.
    pub manage_use_headers: bool,
    /// Applicability predicates; all must pass for `apply` to proceed.
    pub requirements: Vec<Requirement>,
}

impl PolicyCore {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            compile_check: true,
            manage_use_headers: true,
            requirements: Vec::new(),
        }
    }

    pub fn with_requirements(seed: u64, requirements: Vec<Requirement>) -> Self {
        Self {
            requirements,
            ..Self::new(seed)
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform draw over `0..len`; `None` when there is nothing to draw.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }
}

/// A pluggable mutation capability.
///
/// Identity is the unique `name()`. Policies are constructed once at startup,
/// optionally reseeded, and reused across many `apply` calls; apart from the
/// private random stream they hold no state between calls.
pub trait MutationPolicy: Send {
    /// Unique policy name; what the manifest records.
    fn name(&self) -> &str;

    /// Category labels attached to every applied result.
    fn categories(&self) -> BTreeSet<Category>;

    fn core(&self) -> &PolicyCore;

    fn core_mut(&mut self) -> &mut PolicyCore;

    /// Names of policies this one cannot run together with. Declared in the
    /// contract; every shipped policy returns an empty set.
    fn exclusive_with(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn requirements(&self) -> &[Requirement] {
        &self.core().requirements
    }

    fn requirements_met(&self, corpus: &Corpus, scope: NodeId) -> bool {
        self.requirements()
            .iter()
            .all(|requirement| requirement(corpus, scope))
    }

    fn reseed(&mut self, seed: u64) {
        self.core_mut().reseed(seed);
    }

    fn set_compile_check(&mut self, enabled: bool) {
        self.core_mut().compile_check = enabled;
    }

    fn set_manage_use_headers(&mut self, enabled: bool) {
        self.core_mut().manage_use_headers = enabled;
    }

    /// Apply one mutation at a random eligible location inside `scope`.
    ///
    /// Contract:
    /// 1. unmet requirements → `Empty`, no side effect;
    /// 2. no candidate location → `Empty`;
    /// 3. one candidate drawn uniformly from the private stream;
    /// 4. snapshot before mutating;
    /// 5. mutate the live tree in place;
    /// 6. failed compile check (when enabled) → revert to the snapshot,
    ///    return `Empty`;
    /// 7. otherwise an `Applied` result referencing the snapshot.
    fn apply(
        &mut self,
        corpus: &mut Corpus,
        scope: NodeId,
        env: &ApplyEnv<'_>,
    ) -> TransformationResult;
}

/// State captured just before a mutator edits the tree; drives step 4 of the
/// contract and the optional debug detail.
pub struct PreMutation {
    pub element: NodeId,
    pub snapshot: Subtree,
    before: Option<String>,
}

impl PreMutation {
    /// Snapshot `element` (the smallest node containing every edit the
    /// mutator is about to make).
    pub fn capture(corpus: &Corpus, element: NodeId, env: &ApplyEnv<'_>) -> Self {
        let before = env
            .debug
            .then(|| env.provider.pretty_print(corpus, element).unwrap_or_default());
        Self {
            element,
            snapshot: corpus.arena().snapshot(element),
            before,
        }
    }
}

/// Steps 6 and 7 of the `apply` contract, shared by every mutator: refresh
/// use headers, compile-check with revert, and assemble the applied result.
pub fn conclude(
    corpus: &mut Corpus,
    scope: NodeId,
    env: &ApplyEnv<'_>,
    policy_name: &str,
    categories: BTreeSet<Category>,
    pre: PreMutation,
    core: &PolicyCore,
) -> TransformationResult {
    let Some(unit) = corpus.enclosing_unit(pre.element) else {
        return TransformationResult::Empty;
    };

    if core.manage_use_headers {
        env.provider.refresh_use_headers(corpus, unit);
    }

    if core.compile_check && !env.provider.compile_check(corpus, unit) {
        corpus.arena_mut().graft(pre.element, &pre.snapshot);
        if core.manage_use_headers {
            env.provider.refresh_use_headers(corpus, unit);
        }
        return TransformationResult::Empty;
    }

    let unit_name = corpus.unit_name(unit).to_string();
    let element_name = corpus
        .arena()
        .text(pre.element)
        .unwrap_or(&unit_name)
        .to_string();

    let debug = pre.before.map(|before| DebugDetail {
        before,
        after: env
            .provider
            .pretty_print(corpus, pre.element)
            .unwrap_or_default(),
        scope_snapshot: corpus.arena().snapshot(scope),
    });

    TransformationResult::Applied(AppliedTransformation {
        policy: policy_name.to_string(),
        unit: unit_name,
        element: element_name,
        snapshot: pre.snapshot,
        categories,
        debug,
    })
}
