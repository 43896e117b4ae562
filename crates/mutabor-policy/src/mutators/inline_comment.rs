//! Inserts a random line comment at a random statement position.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::category::Category;
use crate::mutators::has_function;
use crate::names::{NameFactory, Randomness};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub struct InlineComment {
    core: PolicyCore,
    names: NameFactory,
}

impl InlineComment {
    pub fn new(seed: u64, randomness: Randomness) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_function]),
            names: NameFactory::new(randomness),
        }
    }
}

impl MutationPolicy for InlineComment {
    fn name(&self) -> &str {
        match self.names.mode() {
            Randomness::Pseudo => "InlineComment",
            Randomness::Full => "InlineCommentFull",
        }
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Comment, Category::Nlp])
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

        let candidates = corpus.functions_in(scope);
        let Some(index) = self.core.pick_index(candidates.len()) else {
            return TransformationResult::Empty;
        };
        let function = candidates[index];
        let Some(body) = corpus.function_body(function) else {
            return TransformationResult::Empty;
        };

        let pre = PreMutation::capture(corpus, function, env);

        let statement_count = corpus.arena().children(body).len();
        let slot = if statement_count == 0 {
            0
        } else {
            self.core.pick_index(statement_count).unwrap_or(0)
        };
        let body_text = self.names.comment(self.core.rng());

        let arena = corpus.arena_mut();
        let comment = arena.alloc(SyntaxKind::Comment, Some(body_text));
        arena.insert_child(body, slot, comment);

        let name = self.name().to_string();
        conclude(corpus, scope, env, &name, self.categories(), pre, &self.core)
    }
}
