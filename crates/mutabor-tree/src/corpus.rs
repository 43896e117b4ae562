//! The corpus: one arena, one root, unit helpers.

use crate::arena::{NodeArena, NodeId};
use crate::kind::SyntaxKind;

/// A parsed corpus of units held in a single arena.
///
/// Shared mutable state by design: the engine and its policies mutate the
/// corpus in place through the arena, one mutation at a time. The corpus is
/// not safe for concurrent readers during a run.
#[derive(Debug, Clone)]
pub struct Corpus {
    arena: NodeArena,
    root: NodeId,
}

impl Corpus {
    pub fn new() -> Self {
        let mut arena = NodeArena::new();
        let root = arena.alloc(SyntaxKind::Corpus, None);
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    /// Top-level units in corpus order.
    pub fn units(&self) -> Vec<NodeId> {
        self.arena
            .children(self.root)
            .iter()
            .copied()
            .filter(|id| self.arena.kind(*id) == SyntaxKind::Unit)
            .collect()
    }

    pub fn unit_name(&self, unit: NodeId) -> &str {
        self.arena.text(unit).unwrap_or("<unnamed>")
    }

    /// The unit containing `id`, or `id` itself if it is a unit.
    pub fn enclosing_unit(&self, id: NodeId) -> Option<NodeId> {
        if self.arena.kind(id) == SyntaxKind::Unit {
            return Some(id);
        }
        self.arena.ancestor_of_kind(id, SyntaxKind::Unit)
    }

    /// Functions declared directly or transitively inside `scope`.
    pub fn functions_in(&self, scope: NodeId) -> Vec<NodeId> {
        self.arena.find_descendants(scope, SyntaxKind::Function)
    }

    /// The body block of a function, if present.
    pub fn function_body(&self, function: NodeId) -> Option<NodeId> {
        self.arena
            .children(function)
            .iter()
            .copied()
            .find(|id| self.arena.kind(*id) == SyntaxKind::Block)
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_with_unit() -> (Corpus, NodeId, NodeId) {
        let mut corpus = Corpus::new();
        let root = corpus.root();
        let unit = corpus
            .arena_mut()
            .alloc(SyntaxKind::Unit, Some("Greeter".into()));
        let function = corpus
            .arena_mut()
            .alloc(SyntaxKind::Function, Some("greet".into()));
        let block = corpus.arena_mut().alloc(SyntaxKind::Block, None);
        corpus.arena_mut().add_child(root, unit);
        corpus.arena_mut().add_child(unit, function);
        corpus.arena_mut().add_child(function, block);
        (corpus, unit, function)
    }

    #[test]
    fn units_and_names() {
        let (corpus, unit, _) = corpus_with_unit();
        assert_eq!(corpus.units(), vec![unit]);
        assert_eq!(corpus.unit_name(unit), "Greeter");
    }

    #[test]
    fn enclosing_unit_from_function() {
        let (corpus, unit, function) = corpus_with_unit();
        assert_eq!(corpus.enclosing_unit(function), Some(unit));
        assert_eq!(corpus.enclosing_unit(unit), Some(unit));
    }

    #[test]
    fn function_body_lookup() {
        let (corpus, _, function) = corpus_with_unit();
        let body = corpus.function_body(function).unwrap();
        assert_eq!(corpus.arena().kind(body), SyntaxKind::Block);
    }
}
