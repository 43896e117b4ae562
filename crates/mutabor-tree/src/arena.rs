//! Index-addressed node storage.
//!
//! The arena owns every node of the corpus. Nodes are addressed by stable
//! [`NodeId`] values; detaching or replacing a subtree never invalidates an
//! id that is still referenced elsewhere. Replaced descendants simply become
//! unreachable from the corpus root.

use serde::{Deserialize, Serialize};

use crate::kind::SyntaxKind;

/// Stable handle to a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: SyntaxKind,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// An owned, independent value copy of a subtree.
///
/// Snapshots are taken before a mutation and used for provenance records and
/// for reverting a mutation that failed its compile check. They never alias
/// the live tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtree {
    pub kind: SyntaxKind,
    pub text: Option<String>,
    pub children: Vec<Subtree>,
}

impl Subtree {
    pub fn leaf(kind: SyntaxKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }
}

/// Arena holding every node of a corpus.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: SyntaxKind, text: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            text,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.nodes[id.index()].kind
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.index()].text = Some(text.into());
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Insert `child` at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let slot = index.min(self.nodes[parent.index()].children.len());
        self.nodes[parent.index()].children.insert(slot, child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Remove `child` from its parent's child list, leaving it allocated but
    /// unreachable.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != child);
        }
    }

    /// Swap `old` for `new` at the same position under `parent`.
    ///
    /// `old` keeps its payload but becomes unreachable from the root.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        self.detach(new);
        let Some(slot) = self.position_in_parent(old) else {
            return;
        };
        self.nodes[parent.index()].children[slot] = new;
        self.nodes[new.index()].parent = Some(parent);
        self.nodes[old.index()].parent = None;
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.index()].parent?;
        self.nodes[parent.index()]
            .children
            .iter()
            .position(|c| *c == id)
    }

    /// Nearest ancestor (excluding `id` itself) with the given kind.
    pub fn ancestor_of_kind(&self, id: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            if self.kind(node) == kind {
                return Some(node);
            }
            cursor = self.parent(node);
        }
        None
    }

    /// All nodes of the subtree rooted at `root` (root included), in
    /// deterministic pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// The pre-order subset of [`descendants`](Self::descendants) with the
    /// given kind. This is the one traversal every policy reuses.
    pub fn find_descendants(&self, root: NodeId, kind: SyntaxKind) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.kind(*id) == kind)
            .collect()
    }

    /// Take an owned snapshot of the subtree rooted at `id`.
    pub fn snapshot(&self, id: NodeId) -> Subtree {
        let node = &self.nodes[id.index()];
        Subtree {
            kind: node.kind,
            text: node.text.clone(),
            children: node.children.iter().map(|c| self.snapshot(*c)).collect(),
        }
    }

    /// Materialize a snapshot as a fresh detached subtree and return its root.
    pub fn adopt(&mut self, subtree: &Subtree) -> NodeId {
        let id = self.alloc(subtree.kind, subtree.text.clone());
        for child in &subtree.children {
            let child_id = self.adopt(child);
            self.add_child(id, child_id);
        }
        id
    }

    /// Replace the subtree rooted at `at` with `subtree`, preserving the id
    /// `at` and its position under its parent.
    ///
    /// The previous descendants of `at` become unreachable. This is the single
    /// sanctioned subtree-replacement primitive; both mutation and
    /// compile-check revert go through it.
    pub fn graft(&mut self, at: NodeId, subtree: &Subtree) {
        let old_children = std::mem::take(&mut self.nodes[at.index()].children);
        for child in old_children {
            self.nodes[child.index()].parent = None;
        }
        self.nodes[at.index()].kind = subtree.kind;
        self.nodes[at.index()].text = subtree.text.clone();
        for child in &subtree.children {
            let child_id = self.adopt(child);
            self.add_child(at, child_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_function(arena: &mut NodeArena) -> NodeId {
        let function = arena.alloc(SyntaxKind::Function, Some("greet".into()));
        let param = arena.alloc(SyntaxKind::Param, Some("name".into()));
        let block = arena.alloc(SyntaxKind::Block, None);
        let ret = arena.alloc(SyntaxKind::ReturnStmt, None);
        let ident = arena.alloc(SyntaxKind::Ident, Some("name".into()));
        arena.add_child(function, param);
        arena.add_child(function, block);
        arena.add_child(block, ret);
        arena.add_child(ret, ident);
        function
    }

    #[test]
    fn alloc_and_link() {
        let mut arena = NodeArena::new();
        let function = tiny_function(&mut arena);

        assert_eq!(arena.kind(function), SyntaxKind::Function);
        assert_eq!(arena.text(function), Some("greet"));
        assert_eq!(arena.children(function).len(), 2);

        let block = arena.children(function)[1];
        assert_eq!(arena.parent(block), Some(function));
        assert_eq!(arena.position_in_parent(block), Some(1));
    }

    #[test]
    fn find_descendants_is_preorder() {
        let mut arena = NodeArena::new();
        let function = tiny_function(&mut arena);

        let all = arena.descendants(function);
        let kinds: Vec<SyntaxKind> = all.iter().map(|id| arena.kind(*id)).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Function,
                SyntaxKind::Param,
                SyntaxKind::Block,
                SyntaxKind::ReturnStmt,
                SyntaxKind::Ident,
            ]
        );

        let idents = arena.find_descendants(function, SyntaxKind::Ident);
        assert_eq!(idents.len(), 1);
        assert_eq!(arena.text(idents[0]), Some("name"));
    }

    #[test]
    fn ancestor_of_kind_walks_up() {
        let mut arena = NodeArena::new();
        let function = tiny_function(&mut arena);
        let ident = arena.find_descendants(function, SyntaxKind::Ident)[0];

        assert_eq!(
            arena.ancestor_of_kind(ident, SyntaxKind::Function),
            Some(function)
        );
        assert_eq!(arena.ancestor_of_kind(ident, SyntaxKind::Unit), None);
    }

    #[test]
    fn snapshot_is_independent_of_later_edits() {
        let mut arena = NodeArena::new();
        let function = tiny_function(&mut arena);

        let before = arena.snapshot(function);
        arena.set_text(function, "renamed");
        let after = arena.snapshot(function);

        assert_eq!(before.text.as_deref(), Some("greet"));
        assert_ne!(before, after);
    }

    #[test]
    fn graft_restores_snapshot_and_keeps_id() {
        let mut arena = NodeArena::new();
        let function = tiny_function(&mut arena);
        let snapshot = arena.snapshot(function);

        // Mutate: drop the body and rename.
        let block = arena.children(function)[1];
        arena.detach(block);
        arena.set_text(function, "mangled");
        assert_ne!(arena.snapshot(function), snapshot);

        arena.graft(function, &snapshot);
        assert_eq!(arena.snapshot(function), snapshot);
        assert_eq!(arena.text(function), Some("greet"));
    }

    #[test]
    fn replace_child_keeps_position() {
        let mut arena = NodeArena::new();
        let block = arena.alloc(SyntaxKind::Block, None);
        let first = arena.alloc(SyntaxKind::Comment, Some("one".into()));
        let second = arena.alloc(SyntaxKind::Comment, Some("two".into()));
        arena.add_child(block, first);
        arena.add_child(block, second);

        let swapped = arena.alloc(SyntaxKind::Comment, Some("three".into()));
        arena.replace_child(block, first, swapped);

        assert_eq!(arena.children(block), &[swapped, second]);
        assert_eq!(arena.parent(first), None);
        assert_eq!(arena.parent(swapped), Some(block));
    }

    #[test]
    fn insert_child_clamps_index() {
        let mut arena = NodeArena::new();
        let block = arena.alloc(SyntaxKind::Block, None);
        let stmt = arena.alloc(SyntaxKind::Comment, Some("tail".into()));
        arena.insert_child(block, 99, stmt);
        assert_eq!(arena.children(block), &[stmt]);
    }
}
