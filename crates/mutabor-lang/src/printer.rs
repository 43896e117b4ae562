//! Deterministic pretty-printer.
//!
//! The printed form is normative: mutated units are re-emitted from the tree,
//! not patched textually. Four-space indentation, one blank line between
//! items, headers first.

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

const INDENT: &str = "    ";

/// Render the subtree rooted at `node` back to source text.
///
/// Works for any node kind; statements and items end with a newline,
/// expressions render inline.
pub fn print(corpus: &Corpus, node: NodeId) -> String {
    let mut out = String::new();
    write_node(corpus, node, 0, &mut out);
    out
}

fn write_node(corpus: &Corpus, node: NodeId, depth: usize, out: &mut String) {
    let arena = corpus.arena();
    match arena.kind(node) {
        SyntaxKind::Corpus => {
            let units = corpus.units();
            for (index, unit) in units.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                write_node(corpus, *unit, depth, out);
            }
        }
        SyntaxKind::Unit => {
            let headers: Vec<NodeId> = arena
                .children(node)
                .iter()
                .copied()
                .filter(|id| arena.kind(*id) == SyntaxKind::UseHeader)
                .collect();
            for header in &headers {
                indent(depth, out);
                out.push_str("use std.");
                out.push_str(arena.text(*header).unwrap_or_default());
                out.push_str(";\n");
            }
            if !headers.is_empty() {
                out.push('\n');
            }

            indent(depth, out);
            out.push_str("unit ");
            out.push_str(arena.text(node).unwrap_or_default());
            out.push_str(" {\n");
            let items: Vec<NodeId> = arena
                .children(node)
                .iter()
                .copied()
                .filter(|id| arena.kind(*id) != SyntaxKind::UseHeader)
                .collect();
            let mut previous_was_function = false;
            for item in items {
                if previous_was_function {
                    out.push('\n');
                }
                write_node(corpus, item, depth + 1, out);
                previous_was_function = arena.kind(item) == SyntaxKind::Function;
            }
            indent(depth, out);
            out.push_str("}\n");
        }
        SyntaxKind::UseHeader => {
            indent(depth, out);
            out.push_str("use std.");
            out.push_str(arena.text(node).unwrap_or_default());
            out.push_str(";\n");
        }
        SyntaxKind::Function => {
            indent(depth, out);
            out.push_str("fn ");
            out.push_str(arena.text(node).unwrap_or_default());
            out.push('(');
            let params: Vec<NodeId> = arena
                .children(node)
                .iter()
                .copied()
                .filter(|id| arena.kind(*id) == SyntaxKind::Param)
                .collect();
            for (index, param) in params.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(arena.text(*param).unwrap_or_default());
            }
            out.push_str(") ");
            if let Some(body) = corpus.function_body(node) {
                write_block(corpus, body, depth, out);
            } else {
                out.push_str("{ }");
            }
            out.push('\n');
        }
        SyntaxKind::Block => {
            write_block(corpus, node, depth, out);
            out.push('\n');
        }
        SyntaxKind::Comment => {
            indent(depth, out);
            out.push_str("// ");
            out.push_str(arena.text(node).unwrap_or_default());
            out.push('\n');
        }
        SyntaxKind::LetStmt => {
            indent(depth, out);
            out.push_str("let ");
            out.push_str(arena.text(node).unwrap_or_default());
            out.push_str(" = ");
            if let Some(value) = arena.children(node).first() {
                out.push_str(&expr(corpus, *value));
            }
            out.push_str(";\n");
        }
        SyntaxKind::ReturnStmt => {
            indent(depth, out);
            out.push_str("return");
            if let Some(value) = arena.children(node).first() {
                out.push(' ');
                out.push_str(&expr(corpus, *value));
            }
            out.push_str(";\n");
        }
        SyntaxKind::ExprStmt => {
            indent(depth, out);
            if let Some(value) = arena.children(node).first() {
                out.push_str(&expr(corpus, *value));
            }
            out.push_str(";\n");
        }
        SyntaxKind::IfStmt => {
            indent(depth, out);
            let children = arena.children(node);
            out.push_str("if ");
            if let Some(condition) = children.first() {
                out.push_str(&expr(corpus, *condition));
            }
            out.push(' ');
            if let Some(then_block) = children.get(1).copied() {
                write_block(corpus, then_block, depth, out);
            }
            if let Some(else_block) = children.get(2).copied() {
                out.push_str(" else ");
                write_block(corpus, else_block, depth, out);
            }
            out.push('\n');
        }
        SyntaxKind::Param => {
            out.push_str(arena.text(node).unwrap_or_default());
        }
        // Expression kinds render inline.
        _ => out.push_str(&expr(corpus, node)),
    }
}

/// Braced statement list, opening brace on the current line.
fn write_block(corpus: &Corpus, block: NodeId, depth: usize, out: &mut String) {
    let statements = corpus.arena().children(block).to_vec();
    if statements.is_empty() {
        out.push_str("{ }");
        return;
    }
    out.push_str("{\n");
    for stmt in statements {
        write_node(corpus, stmt, depth + 1, out);
    }
    indent(depth, out);
    out.push('}');
}

fn expr(corpus: &Corpus, node: NodeId) -> String {
    let arena = corpus.arena();
    match arena.kind(node) {
        SyntaxKind::IntLiteral | SyntaxKind::FloatLiteral | SyntaxKind::BoolLiteral => {
            arena.text(node).unwrap_or_default().to_string()
        }
        SyntaxKind::StringLiteral => format!("\"{}\"", arena.text(node).unwrap_or_default()),
        SyntaxKind::Ident => arena.text(node).unwrap_or_default().to_string(),
        SyntaxKind::Call => {
            let args: Vec<String> = arena
                .children(node)
                .iter()
                .map(|arg| expr(corpus, *arg))
                .collect();
            format!(
                "{}({})",
                arena.text(node).unwrap_or_default(),
                args.join(", ")
            )
        }
        SyntaxKind::Binary => {
            let children = arena.children(node);
            let lhs = children.first().map(|c| operand(corpus, *c)).unwrap_or_default();
            let rhs = children.get(1).map(|c| operand(corpus, *c)).unwrap_or_default();
            format!("{} {} {}", lhs, arena.text(node).unwrap_or_default(), rhs)
        }
        other => format!("<{other:?}>"),
    }
}

/// Operands that are themselves binary get parenthesized, which keeps the
/// printed form unambiguous without tracking source parentheses.
fn operand(corpus: &Corpus, node: NodeId) -> String {
    if corpus.arena().kind(node) == SyntaxKind::Binary {
        format!("({})", expr(corpus, node))
    } else {
        expr(corpus, node)
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
