//! The shipped mutation policies.
//!
//! Every mutator follows the same shape: check requirements, enumerate
//! candidates through the arena query, draw one with the private stream,
//! capture a [`PreMutation`](crate::policy::PreMutation), edit the tree in
//! place, and hand off to [`conclude`](crate::policy::conclude) for the
//! compile-check/revert and result assembly.

mod empty_function;
mod false_branch_else;
mod inline_comment;
mod neutral_element;
mod parameter_rename;
mod true_branch;
mod unused_variable;

pub use empty_function::EmptyFunction;
pub use false_branch_else::FalseBranchElse;
pub use inline_comment::InlineComment;
pub use neutral_element::NeutralElement;
pub use parameter_rename::ParameterRename;
pub use true_branch::TrueBranch;
pub use unused_variable::UnusedVariable;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

use crate::names::Randomness;
use crate::policy::MutationPolicy;

/// The default roster, mirroring what a plain run registers.
pub fn standard_policies(seed: u64) -> Vec<Box<dyn MutationPolicy>> {
    vec![
        Box::new(TrueBranch::new(seed)),
        Box::new(FalseBranchElse::new(seed)),
        Box::new(InlineComment::new(seed, Randomness::Pseudo)),
        Box::new(ParameterRename::new(seed, Randomness::Pseudo)),
        Box::new(UnusedVariable::new(seed, Randomness::Pseudo)),
        Box::new(NeutralElement::new(seed)),
        Box::new(EmptyFunction::new(seed, Randomness::Pseudo)),
    ]
}

// ── Candidate enumeration shared across mutators ────────────────────────

pub(crate) fn functions_with_statements(corpus: &Corpus, scope: NodeId) -> Vec<NodeId> {
    corpus
        .functions_in(scope)
        .into_iter()
        .filter(|function| {
            corpus
                .function_body(*function)
                .map(|body| !corpus.arena().children(body).is_empty())
                .unwrap_or(false)
        })
        .collect()
}

pub(crate) fn functions_with_params(corpus: &Corpus, scope: NodeId) -> Vec<NodeId> {
    corpus
        .functions_in(scope)
        .into_iter()
        .filter(|function| {
            corpus
                .arena()
                .children(*function)
                .iter()
                .any(|child| corpus.arena().kind(*child) == SyntaxKind::Param)
        })
        .collect()
}

pub(crate) fn supported_literals(corpus: &Corpus, scope: NodeId) -> Vec<NodeId> {
    let arena = corpus.arena();
    arena
        .descendants(scope)
        .into_iter()
        .filter(|id| {
            matches!(
                arena.kind(*id),
                SyntaxKind::IntLiteral | SyntaxKind::FloatLiteral | SyntaxKind::StringLiteral
            )
        })
        .filter(|id| arena.ancestor_of_kind(*id, SyntaxKind::Function).is_some())
        .collect()
}

/// Names already bound inside a function: parameters and let-bindings.
pub(crate) fn bound_names(corpus: &Corpus, function: NodeId) -> Vec<String> {
    let arena = corpus.arena();
    let mut names: Vec<String> = arena
        .children(function)
        .iter()
        .copied()
        .filter(|id| arena.kind(*id) == SyntaxKind::Param)
        .filter_map(|id| arena.text(id).map(str::to_string))
        .collect();
    names.extend(
        arena
            .find_descendants(function, SyntaxKind::LetStmt)
            .into_iter()
            .filter_map(|id| arena.text(id).map(str::to_string)),
    );
    names
}

// ── Requirement predicates ──────────────────────────────────────────────

pub(crate) fn has_function(corpus: &Corpus, scope: NodeId) -> bool {
    !corpus.functions_in(scope).is_empty()
}

pub(crate) fn has_function_with_statements(corpus: &Corpus, scope: NodeId) -> bool {
    !functions_with_statements(corpus, scope).is_empty()
}

pub(crate) fn has_function_with_params(corpus: &Corpus, scope: NodeId) -> bool {
    !functions_with_params(corpus, scope).is_empty()
}

pub(crate) fn has_supported_literal(corpus: &Corpus, scope: NodeId) -> bool {
    !supported_literals(corpus, scope).is_empty()
}

pub(crate) fn has_unit(corpus: &Corpus, scope: NodeId) -> bool {
    !corpus
        .arena()
        .find_descendants(scope, SyntaxKind::Unit)
        .is_empty()
}


#[cfg(test)]
mod tests {
    use super::testkit::{corpus_of, env, printed, RejectingProvider};
    use super::*;
    use crate::policy::ApplyEnv;
    use crate::result::TransformationResult;
    use mutabor_lang::LangProvider;

    const SOURCE: &str = "\
unit Alpha {
    fn first(x) {
        let y = x + 1;
        return y;
    }

    fn second() {
        return 2;
    }
}
";

    #[test]
    fn same_seed_same_mutation() {
        let provider = LangProvider::new();

        let mut left = corpus_of(SOURCE);
        let mut right = corpus_of(SOURCE);
        let mut policy_left = TrueBranch::new(42);
        let mut policy_right = TrueBranch::new(42);

        let scope_left = left.root();
        let scope_right = right.root();
        let result_left = policy_left.apply(&mut left, scope_left, &env(&provider));
        let result_right = policy_right.apply(&mut right, scope_right, &env(&provider));

        assert_eq!(result_left, result_right);
        assert_eq!(printed(&left), printed(&right));
    }

    #[test]
    fn failed_compile_check_reverts_the_tree() {
        let rejecting = RejectingProvider::new();
        let mut corpus = corpus_of(SOURCE);
        let original = printed(&corpus);

        let mut policy = TrueBranch::new(42);
        let scope = corpus.root();
        let result = policy.apply(
            &mut corpus,
            scope,
            &ApplyEnv {
                provider: &rejecting,
                debug: false,
            },
        );

        assert_eq!(result, TransformationResult::Empty);
        assert_eq!(printed(&corpus), original);
    }

    #[test]
    fn debug_mode_attaches_before_and_after() {
        let provider = LangProvider::new();
        let mut corpus = corpus_of(SOURCE);
        let mut policy = TrueBranch::new(42);

        let scope = corpus.root();
        let result = policy.apply(
            &mut corpus,
            scope,
            &ApplyEnv {
                provider: &provider,
                debug: true,
            },
        );

        let applied = result.as_applied().unwrap();
        let debug = applied.debug.as_ref().unwrap();
        assert_ne!(debug.before, debug.after);
        assert!(debug.after.contains("if true"));
    }

    #[test]
    fn standard_roster_has_unique_names() {
        let policies = standard_policies(1);
        let mut names: Vec<&str> = policies.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), policies.len());
    }
}
