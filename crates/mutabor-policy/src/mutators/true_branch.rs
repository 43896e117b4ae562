//! Wraps a function body in a trivially-true conditional.
//!
//! ```text
//! fn f(x) { return x; }
//! // becomes
//! fn f(x) { if true { return x; } else { return 0; } }
//! ```
//!
//! The else-branch with a neutral return is only added when the body
//! contains a return, keeping every path terminated.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::category::Category;
use crate::mutators::{functions_with_statements, has_function_with_statements};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub const NAME: &str = "TrueBranch";

pub struct TrueBranch {
    core: PolicyCore,
}

impl TrueBranch {
    pub fn new(seed: u64) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_function_with_statements]),
        }
    }
}

impl MutationPolicy for TrueBranch {
    fn name(&self) -> &str {
        NAME
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Structure, Category::Smell])
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

        let candidates = functions_with_statements(corpus, scope);
        let Some(index) = self.core.pick_index(candidates.len()) else {
            return TransformationResult::Empty;
        };
        let function = candidates[index];
        let Some(body) = corpus.function_body(function) else {
            return TransformationResult::Empty;
        };

        let pre = PreMutation::capture(corpus, function, env);

        let has_return = !corpus
            .arena()
            .find_descendants(body, SyntaxKind::ReturnStmt)
            .is_empty();

        let arena = corpus.arena_mut();
        let wrapper = arena.alloc(SyntaxKind::Block, None);
        let if_stmt = arena.alloc(SyntaxKind::IfStmt, None);
        let condition = arena.alloc(SyntaxKind::BoolLiteral, Some("true".into()));

        arena.replace_child(function, body, wrapper);
        arena.add_child(wrapper, if_stmt);
        arena.add_child(if_stmt, condition);
        arena.add_child(if_stmt, body);

        if has_return {
            let else_block = arena.alloc(SyntaxKind::Block, None);
            let neutral_return = arena.alloc(SyntaxKind::ReturnStmt, None);
            let zero = arena.alloc(SyntaxKind::IntLiteral, Some("0".into()));
            arena.add_child(neutral_return, zero);
            arena.add_child(else_block, neutral_return);
            arena.add_child(if_stmt, else_block);
        }

        conclude(corpus, scope, env, NAME, self.categories(), pre, &self.core)
    }
}
