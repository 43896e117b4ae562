//! Inserts an unused let-binding with a random name and literal.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};
use rand::Rng;

use crate::category::Category;
use crate::mutators::{bound_names, has_function};
use crate::names::{NameFactory, Randomness};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub struct UnusedVariable {
    core: PolicyCore,
    names: NameFactory,
}

impl UnusedVariable {
    pub fn new(seed: u64, randomness: Randomness) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_function]),
            names: NameFactory::new(randomness),
        }
    }

    /// A random literal initializer: int, float or string.
    fn random_literal(&mut self) -> (SyntaxKind, String) {
        match self.core.rng().gen_range(0..3u8) {
            0 => {
                let value = self.core.rng().gen_range(0..1000i64);
                (SyntaxKind::IntLiteral, value.to_string())
            }
            1 => {
                let value = self.core.rng().gen_range(0..100i64);
                (SyntaxKind::FloatLiteral, format!("{value}.5"))
            }
            _ => {
                let text = self.names.identifier(self.core.rng());
                (SyntaxKind::StringLiteral, text)
            }
        }
    }
}

impl MutationPolicy for UnusedVariable {
    fn name(&self) -> &str {
        match self.names.mode() {
            Randomness::Pseudo => "UnusedVariable",
            Randomness::Full => "UnusedVariableFull",
        }
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Naming, Category::Smell])
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

        let variable = self.names.identifier(self.core.rng());
        if bound_names(corpus, function).contains(&variable) {
            return TransformationResult::Empty;
        }
        let (literal_kind, literal_text) = self.random_literal();

        let pre = PreMutation::capture(corpus, function, env);

        let statement_count = corpus.arena().children(body).len();
        let slot = if statement_count == 0 {
            0
        } else {
            self.core.pick_index(statement_count + 1).unwrap_or(0)
        };

        let arena = corpus.arena_mut();
        let let_stmt = arena.alloc(SyntaxKind::LetStmt, Some(variable));
        let literal = arena.alloc(literal_kind, Some(literal_text));
        arena.add_child(let_stmt, literal);
        arena.insert_child(body, slot, let_stmt);

        let name = self.name().to_string();
        conclude(corpus, scope, env, &name, self.categories(), pre, &self.core)
    }
}
