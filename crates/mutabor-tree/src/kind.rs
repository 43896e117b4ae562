//! Node-kind tags.

use serde::{Deserialize, Serialize};

/// The kind tag carried by every arena node.
///
/// Queries ([`crate::NodeArena::find_descendants`]) are parameterized by this
/// tag, so policies never write their own traversal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    /// The corpus root; its children are units.
    Corpus,
    /// A top-level compilable item; text = unit name.
    Unit,
    /// A `use std.<builtin>;` header; text = builtin name.
    UseHeader,
    /// A function item; text = function name.
    Function,
    /// A function parameter; text = parameter name.
    Param,
    /// A brace-delimited statement list.
    Block,
    /// `let <name> = <expr>;`; text = variable name, single child = initializer.
    LetStmt,
    /// `return [<expr>];`; zero or one child.
    ReturnStmt,
    /// A bare expression statement; single child.
    ExprStmt,
    /// `if <expr> { .. } [else { .. }]`; children = condition, then-block,
    /// optional else-block.
    IfStmt,
    /// A line comment; text = comment body without the `//`.
    Comment,
    /// Integer literal; text = lexeme.
    IntLiteral,
    /// Float literal; text = lexeme.
    FloatLiteral,
    /// String literal; text = unquoted contents.
    StringLiteral,
    /// `true` / `false`; text = lexeme.
    BoolLiteral,
    /// An identifier expression; text = name.
    Ident,
    /// A call expression; text = callee name, children = arguments.
    Call,
    /// A binary expression; text = operator, children = lhs and rhs.
    Binary,
}

impl SyntaxKind {
    /// Kinds that appear as statements inside a [`SyntaxKind::Block`].
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::LetStmt
                | SyntaxKind::ReturnStmt
                | SyntaxKind::ExprStmt
                | SyntaxKind::IfStmt
                | SyntaxKind::Comment
        )
    }

    /// Literal expression kinds.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::BoolLiteral
        )
    }
}
