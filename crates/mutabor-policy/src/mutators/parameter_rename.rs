//! Renames one function parameter, uses included, to a random name.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::category::Category;
use crate::mutators::{bound_names, functions_with_params, has_function_with_params};
use crate::names::{NameFactory, Randomness};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub struct ParameterRename {
    core: PolicyCore,
    names: NameFactory,
}

impl ParameterRename {
    pub fn new(seed: u64, randomness: Randomness) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_function_with_params]),
            names: NameFactory::new(randomness),
        }
    }
}

impl MutationPolicy for ParameterRename {
    fn name(&self) -> &str {
        match self.names.mode() {
            Randomness::Pseudo => "ParameterRename",
            Randomness::Full => "ParameterRenameFull",
        }
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Naming, Category::Nlp])
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

        let candidates = functions_with_params(corpus, scope);
        let Some(index) = self.core.pick_index(candidates.len()) else {
            return TransformationResult::Empty;
        };
        let function = candidates[index];

        let params: Vec<NodeId> = corpus
            .arena()
            .children(function)
            .iter()
            .copied()
            .filter(|id| corpus.arena().kind(*id) == SyntaxKind::Param)
            .collect();
        let Some(param_index) = self.core.pick_index(params.len()) else {
            return TransformationResult::Empty;
        };
        let param = params[param_index];
        let Some(old_name) = corpus.arena().text(param).map(str::to_string) else {
            return TransformationResult::Empty;
        };

        let new_name = self.names.identifier(self.core.rng());
        // A colliding draw is an unproductive attempt, not an error; the
        // caller's retry loop gets another chance with a fresh draw.
        if bound_names(corpus, function).contains(&new_name) {
            return TransformationResult::Empty;
        }

        let pre = PreMutation::capture(corpus, function, env);

        let idents: Vec<NodeId> = corpus
            .arena()
            .find_descendants(function, SyntaxKind::Ident)
            .into_iter()
            .filter(|id| corpus.arena().text(*id) == Some(old_name.as_str()))
            .collect();

        let arena = corpus.arena_mut();
        arena.set_text(param, new_name.clone());
        for ident in idents {
            arena.set_text(ident, new_name.clone());
        }

        let name = self.name().to_string();
        conclude(corpus, scope, env, &name, self.categories(), pre, &self.core)
    }
}
