//! Structural compile checker.
//!
//! Not a semantic analyzer: the checks are the structural subset a mutated
//! unit must keep satisfying to count as compilable — name resolution,
//! duplicate detection, and valid use headers.

use std::collections::BTreeSet;

use mutabor_tree::{Corpus, NodeId, SyntaxKind};

/// Builtin functions of the `std` namespace. Calling one requires a matching
/// `use std.<name>;` header on the unit.
pub const BUILTINS: &[&str] = &["len", "print", "readline", "str"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Validate one unit. An empty diagnostic list means the unit passes.
pub fn check_unit(corpus: &Corpus, unit: NodeId) -> Vec<String> {
    let arena = corpus.arena();
    let mut diagnostics = Vec::new();

    let mut headers = BTreeSet::new();
    for header in arena.find_descendants(unit, SyntaxKind::UseHeader) {
        let name = arena.text(header).unwrap_or_default().to_string();
        if !is_builtin(&name) {
            diagnostics.push(format!("use header names unknown builtin '{name}'"));
        }
        if !headers.insert(name.clone()) {
            diagnostics.push(format!("duplicate use header '{name}'"));
        }
    }

    let functions = corpus.functions_in(unit);
    let mut function_names = BTreeSet::new();
    for function in &functions {
        let name = arena.text(*function).unwrap_or_default().to_string();
        if !function_names.insert(name.clone()) {
            diagnostics.push(format!("duplicate function '{name}'"));
        }
    }

    for function in &functions {
        check_function(corpus, unit, *function, &headers, &function_names, &mut diagnostics);
    }

    diagnostics
}

fn check_function(
    corpus: &Corpus,
    _unit: NodeId,
    function: NodeId,
    headers: &BTreeSet<String>,
    function_names: &BTreeSet<String>,
    diagnostics: &mut Vec<String>,
) {
    let arena = corpus.arena();
    let function_name = arena.text(function).unwrap_or_default();

    let mut names = BTreeSet::new();
    for param in arena
        .children(function)
        .iter()
        .copied()
        .filter(|id| arena.kind(*id) == SyntaxKind::Param)
    {
        let name = arena.text(param).unwrap_or_default().to_string();
        if !names.insert(name.clone()) {
            diagnostics.push(format!(
                "duplicate parameter '{name}' in function '{function_name}'"
            ));
        }
    }

    // Let-bindings are collected function-wide; the checker is deliberately
    // lenient about declaration order inside branches.
    for let_stmt in arena.find_descendants(function, SyntaxKind::LetStmt) {
        names.insert(arena.text(let_stmt).unwrap_or_default().to_string());
    }

    for ident in arena.find_descendants(function, SyntaxKind::Ident) {
        let name = arena.text(ident).unwrap_or_default();
        if !names.contains(name) {
            diagnostics.push(format!(
                "unresolved name '{name}' in function '{function_name}'"
            ));
        }
    }

    for call in arena.find_descendants(function, SyntaxKind::Call) {
        let callee = arena.text(call).unwrap_or_default();
        if function_names.contains(callee) {
            continue;
        }
        if is_builtin(callee) {
            if !headers.contains(callee) {
                diagnostics.push(format!(
                    "builtin '{callee}' called without a use header in function '{function_name}'"
                ));
            }
            continue;
        }
        diagnostics.push(format!(
            "call to unknown function '{callee}' in function '{function_name}'"
        ));
    }
}
