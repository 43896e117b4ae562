//! Adds an empty function with a random name to a unit.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::category::Category;
use crate::mutators::has_unit;
use crate::names::{NameFactory, Randomness};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub struct EmptyFunction {
    core: PolicyCore,
    names: NameFactory,
}

impl EmptyFunction {
    pub fn new(seed: u64, randomness: Randomness) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_unit]),
            names: NameFactory::new(randomness),
        }
    }
}

impl MutationPolicy for EmptyFunction {
    fn name(&self) -> &str {
        match self.names.mode() {
            Randomness::Pseudo => "EmptyFunction",
            Randomness::Full => "EmptyFunctionFull",
        }
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Structure, Category::Naming])
    }

    fn core(&self) -> &PolicyCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PolicyCore {
        &mut self.core
    }

    fn apply(
        &mut self,
        corpus: &mut Corpus,
        scope: NodeId,
        env: &ApplyEnv<'_>,
    ) -> TransformationResult {
        if !self.requirements_met(corpus, scope) {
            return TransformationResult::Empty;
        }

        let candidates = corpus.arena().find_descendants(scope, SyntaxKind::Unit);
        let Some(index) = self.core.pick_index(candidates.len()) else {
            return TransformationResult::Empty;
        };
        let unit = candidates[index];

        let function_name = self.names.identifier(self.core.rng());
        let taken = corpus
            .functions_in(unit)
            .iter()
            .any(|f| corpus.arena().text(*f) == Some(function_name.as_str()));
        if taken {
            return TransformationResult::Empty;
        }

        let pre = PreMutation::capture(corpus, unit, env);

        let arena = corpus.arena_mut();
        let function = arena.alloc(SyntaxKind::Function, Some(function_name));
        let body = arena.alloc(SyntaxKind::Block, None);
        arena.add_child(function, body);
        arena.add_child(unit, function);

        let name = self.name().to_string();
        conclude(corpus, scope, env, &name, self.categories(), pre, &self.core)
    }
}
