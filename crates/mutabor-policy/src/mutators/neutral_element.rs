//! Replaces a literal `L` with `L + <neutral element>`.
//!
//! `42` becomes `42 + 0`, `1.5` becomes `1.5 + 0.0`, `"a"` becomes
//! `"a" + ""`. Booleans are left alone.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::category::Category;
use crate::mutators::{has_supported_literal, supported_literals};
use crate::policy::{conclude, ApplyEnv, MutationPolicy, PolicyCore, PreMutation};
use crate::result::TransformationResult;

pub const NAME: &str = "NeutralElement";

pub struct NeutralElement {
    core: PolicyCore,
}

impl NeutralElement {
    pub fn new(seed: u64) -> Self {
        Self {
            core: PolicyCore::with_requirements(seed, vec![has_supported_literal]),
        }
    }
}

fn neutral_text(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::IntLiteral => "0",
        SyntaxKind::FloatLiteral => "0.0",
        _ => "",
    }
}

impl MutationPolicy for NeutralElement {
    fn name(&self) -> &str {
        NAME
    }

    fn categories(&self) -> BTreeSet<Category> {
        BTreeSet::from([Category::Structure, Category::Bytecode])
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

        let candidates = supported_literals(corpus, scope);
        let Some(index) = self.core.pick_index(candidates.len()) else {
            return TransformationResult::Empty;
        };
        let literal = candidates[index];
        let Some(parent) = corpus.arena().parent(literal) else {
            return TransformationResult::Empty;
        };
        let Some(function) = corpus
            .arena()
            .ancestor_of_kind(literal, SyntaxKind::Function)
        else {
            return TransformationResult::Empty;
        };

        let pre = PreMutation::capture(corpus, function, env);

        let kind = corpus.arena().kind(literal);
        let arena = corpus.arena_mut();
        let sum = arena.alloc(SyntaxKind::Binary, Some("+".into()));
        let neutral = arena.alloc(kind, Some(neutral_text(kind).to_string()));
        arena.replace_child(parent, literal, sum);
        arena.add_child(sum, literal);
        arena.add_child(sum, neutral);

        conclude(corpus, scope, env, NAME, self.categories(), pre, &self.core)
    }
}
