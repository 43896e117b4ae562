//! Moves a function body into the else-branch of a trivially-false
//! conditional.
//!
//! ```text
//! fn f(x) { return x; }
//! // becomes
//! fn f(x) { if false { return 0; } else { return x; } }
//! ```

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::category::Category;
use crate::mutators::{functions_with_statements, has_function_with_statements};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub const NAME: &str = "FalseBranchElse";

pub struct FalseBranchElse {
    core: PolicyCore,
}

impl FalseBranchElse {
    pub fn new(seed: u64) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_function_with_statements]),
        }
    }
}

impl MutationPolicy for FalseBranchElse {
    fn name(&self) -> &str {
        NAME
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::ControlFlow, Category::Structure])
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

        let arena = corpus.arena_mut();
        let wrapper = arena.alloc(SyntaxKind::Block, None);
        let if_stmt = arena.alloc(SyntaxKind::IfStmt, None);
        let condition = arena.alloc(SyntaxKind::BoolLiteral, Some("false".into()));
        let dead_block = arena.alloc(SyntaxKind::Block, None);
        let dead_return = arena.alloc(SyntaxKind::ReturnStmt, None);
        let zero = arena.alloc(SyntaxKind::IntLiteral, Some("0".into()));

        arena.replace_child(function, body, wrapper);
        arena.add_child(wrapper, if_stmt);
        arena.add_child(if_stmt, condition);
        arena.add_child(dead_return, zero);
        arena.add_child(dead_block, dead_return);
        arena.add_child(if_stmt, dead_block);
        arena.add_child(if_stmt, body);

        conclude(corpus, scope, env, NAME, self.categories(), pre, &self.core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutators::testkit::{corpus_of, env, printed};
    use mutabor_lang::LangProvider;
    use mutabor_tree::AstProvider;

    #[test]
    fn body_moves_into_else_branch() {
        let provider = LangProvider::new();
        let mut corpus = corpus_of("unit A { fn f(x) { return x + 1; } }");
        let mut policy = FalseBranchElse::new(3);

        let scope = corpus.root();
        let result = policy.apply(&mut corpus, scope, &env(&provider));
        assert!(result.is_applied());

        let text = printed(&corpus);
        assert!(text.contains("if false {"));
        assert!(text.contains("} else {"));
        assert!(text.contains("return x + 1;"));
        assert!(provider.compile_check(&corpus, corpus.units()[0]));
    }

    #[test]
    fn requires_a_statement_bearing_function() {
        let provider = LangProvider::new();
        let mut corpus = corpus_of("unit A { fn f() { } }");
        let mut policy = FalseBranchElse::new(3);

        let scope = corpus.root();
        assert_eq!(
            policy.apply(&mut corpus, scope, &env(&provider)),
            TransformationResult::Empty
        );
    }
}
