//! Scope strategies: distributing a mutation quota across the corpus.

use std::str::FromStr;

use mutabor_tree::{Corpus, NodeId};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How the requested total quota maps to (target scope, local quota) pairs.
///
/// Units are top-level items, subunits are functions with a non-empty body.
/// The plain variants distribute the total `N` across targets (sum exactly
/// `N`); the `-each` variants give every target its own full `N`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeStrategy {
    /// One pool, the whole corpus; candidates drawn corpus-wide.
    #[default]
    Global,
    /// `N` draws total, each against a uniformly chosen unit.
    PerUnit,
    /// Every unit independently receives `N` draws.
    PerUnitEach,
    /// `N` draws total, each against a uniformly chosen eligible subunit.
    PerSubunit,
    /// Every eligible subunit independently receives `N` draws.
    PerSubunitEach,
}

impl ScopeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeStrategy::Global => "global",
            ScopeStrategy::PerUnit => "per-unit",
            ScopeStrategy::PerUnitEach => "per-unit-each",
            ScopeStrategy::PerSubunit => "per-subunit",
            ScopeStrategy::PerSubunitEach => "per-subunit-each",
        }
    }
}

impl std::fmt::Display for ScopeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeStrategy {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "global" => Ok(ScopeStrategy::Global),
            "per-unit" => Ok(ScopeStrategy::PerUnit),
            "per-unit-each" => Ok(ScopeStrategy::PerUnitEach),
            "per-subunit" => Ok(ScopeStrategy::PerSubunit),
            "per-subunit-each" => Ok(ScopeStrategy::PerSubunitEach),
            other => Err(ConfigurationError::UnknownScope(other.to_string())),
        }
    }
}

/// Subunits meeting the eligibility bar: functions with a non-empty body.
pub(crate) fn eligible_subunits(corpus: &Corpus) -> Vec<NodeId> {
    corpus
        .units()
        .into_iter()
        .flat_map(|unit| corpus.functions_in(unit))
        .filter(|function| {
            corpus
                .function_body(*function)
                .map(|body| !corpus.arena().children(body).is_empty())
                .unwrap_or(false)
        })
        .collect()
}

/// Compute the (target, local quota) pairs covering the corpus.
///
/// For the non-`each` variants the quota is split by `quota` uniform draws
/// over the targets, so the pairs always sum to exactly `quota` and the split
/// is a pure function of the selection stream.
pub(crate) fn plan_scopes(
    strategy: ScopeStrategy,
    corpus: &Corpus,
    quota: u64,
    rng: &mut StdRng,
) -> Vec<(NodeId, u64)> {
    match strategy {
        ScopeStrategy::Global => vec![(corpus.root(), quota)],
        ScopeStrategy::PerUnitEach => corpus
            .units()
            .into_iter()
            .map(|unit| (unit, quota))
            .collect(),
        ScopeStrategy::PerUnit => split_by_draws(corpus.units(), quota, rng),
        ScopeStrategy::PerSubunitEach => eligible_subunits(corpus)
            .into_iter()
            .map(|subunit| (subunit, quota))
            .collect(),
        ScopeStrategy::PerSubunit => split_by_draws(eligible_subunits(corpus), quota, rng),
    }
}

fn split_by_draws(targets: Vec<NodeId>, quota: u64, rng: &mut StdRng) -> Vec<(NodeId, u64)> {
    if targets.is_empty() {
        return Vec::new();
    }
    let mut counts = vec![0u64; targets.len()];
    for _ in 0..quota {
        counts[rng.gen_range(0..targets.len())] += 1;
    }
    targets
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutabor_tree::SyntaxKind;
    use rand::SeedableRng;

    fn corpus_with_units(units: usize, functions_per_unit: usize) -> Corpus {
        let mut corpus = Corpus::new();
        let root = corpus.root();
        for unit_index in 0..units {
            let unit = corpus
                .arena_mut()
                .alloc(SyntaxKind::Unit, Some(format!("U{unit_index}")));
            corpus.arena_mut().add_child(root, unit);
            for function_index in 0..functions_per_unit {
                let function = corpus
                    .arena_mut()
                    .alloc(SyntaxKind::Function, Some(format!("f{unit_index}_{function_index}")));
                let block = corpus.arena_mut().alloc(SyntaxKind::Block, None);
                let stmt = corpus.arena_mut().alloc(SyntaxKind::ReturnStmt, None);
                corpus.arena_mut().add_child(block, stmt);
                corpus.arena_mut().add_child(function, block);
                corpus.arena_mut().add_child(unit, function);
            }
        }
        corpus
    }

    #[test]
    fn parses_every_name() {
        for name in [
            "global",
            "per-unit",
            "per-unit-each",
            "per-subunit",
            "per-subunit-each",
        ] {
            let strategy: ScopeStrategy = name.parse().unwrap();
            assert_eq!(strategy.as_str(), name);
        }
        assert!(matches!(
            "per-class".parse::<ScopeStrategy>(),
            Err(ConfigurationError::UnknownScope(_))
        ));
    }

    #[test]
    fn global_is_one_pool() {
        let corpus = corpus_with_units(3, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let scopes = plan_scopes(ScopeStrategy::Global, &corpus, 10, &mut rng);
        assert_eq!(scopes, vec![(corpus.root(), 10)]);
    }

    #[test]
    fn per_unit_sums_to_quota() {
        let corpus = corpus_with_units(4, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let scopes = plan_scopes(ScopeStrategy::PerUnit, &corpus, 11, &mut rng);
        let total: u64 = scopes.iter().map(|(_, quota)| quota).sum();
        assert_eq!(total, 11);
        assert!(scopes.len() <= 4);
    }

    #[test]
    fn per_unit_each_gives_every_unit_the_quota() {
        let corpus = corpus_with_units(3, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let scopes = plan_scopes(ScopeStrategy::PerUnitEach, &corpus, 5, &mut rng);
        assert_eq!(scopes.len(), 3);
        assert!(scopes.iter().all(|(_, quota)| *quota == 5));
    }

    #[test]
    fn per_subunit_each_targets_eligible_functions() {
        let mut corpus = corpus_with_units(2, 2);
        // Add an empty-bodied function; it must not become a target.
        let unit = corpus.units()[0];
        let function = corpus
            .arena_mut()
            .alloc(SyntaxKind::Function, Some("hollow".into()));
        let block = corpus.arena_mut().alloc(SyntaxKind::Block, None);
        corpus.arena_mut().add_child(function, block);
        corpus.arena_mut().add_child(unit, function);

        let mut rng = StdRng::seed_from_u64(1);
        let scopes = plan_scopes(ScopeStrategy::PerSubunitEach, &corpus, 3, &mut rng);
        assert_eq!(scopes.len(), 4);
        assert!(scopes.iter().all(|(_, quota)| *quota == 3));
    }

    #[test]
    fn empty_corpus_plans_nothing_for_unit_strategies() {
        let corpus = Corpus::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_scopes(ScopeStrategy::PerUnit, &corpus, 5, &mut rng).is_empty());
        assert!(plan_scopes(ScopeStrategy::PerUnitEach, &corpus, 5, &mut rng).is_empty());
    }

    #[test]
    fn split_is_deterministic_per_seed() {
        let corpus = corpus_with_units(5, 1);
        let mut rng_a = StdRng::seed_from_u64(77);
        let mut rng_b = StdRng::seed_from_u64(77);
        assert_eq!(
            plan_scopes(ScopeStrategy::PerUnit, &corpus, 20, &mut rng_a),
            plan_scopes(ScopeStrategy::PerUnit, &corpus, 20, &mut rng_b)
        );
    }
}
