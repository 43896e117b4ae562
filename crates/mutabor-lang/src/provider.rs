//! The [`AstProvider`] implementation for the reference language.

use std::path::Path;

use mutabor_tree::{AstProvider, Corpus, NodeId, ProviderError, SyntaxKind};
use tracing::debug;

use crate::checker;
use crate::parser;
use crate::printer;

/// File extension of reference-language sources.
pub const SOURCE_EXTENSION: &str = "mu";

/// Parser, pretty-printer and compile checker for the reference language.
#[derive(Debug, Clone, Copy, Default)]
pub struct LangProvider;

impl LangProvider {
    pub fn new() -> Self {
        Self
    }
}

impl AstProvider for LangProvider {
    fn parse_dir(&self, dir: &Path) -> Result<Corpus, ProviderError> {
        let mut files: Vec<std::path::PathBuf> = std::fs::read_dir(dir)
            .map_err(|source| ProviderError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == SOURCE_EXTENSION)
                    .unwrap_or(false)
            })
            .collect();
        // Deterministic parse order regardless of directory iteration order.
        files.sort();

        let mut corpus = Corpus::new();
        for path in files {
            let text = std::fs::read_to_string(&path).map_err(|source| ProviderError::Io {
                path: path.clone(),
                source,
            })?;
            let file = path.to_string_lossy().into_owned();
            let units = self.parse_source(&mut corpus, &file, &text)?;
            debug!(file = %file, units = units.len(), "parsed source file");
        }
        Ok(corpus)
    }

    fn parse_source(
        &self,
        corpus: &mut Corpus,
        file: &str,
        text: &str,
    ) -> Result<Vec<NodeId>, ProviderError> {
        parser::parse_file(corpus, text).map_err(|err| ProviderError::Parse {
            file: file.to_string(),
            message: err.to_string(),
        })
    }

    fn pretty_print(&self, corpus: &Corpus, node: NodeId) -> Result<String, ProviderError> {
        Ok(printer::print(corpus, node))
    }

    fn compile_check(&self, corpus: &Corpus, unit: NodeId) -> bool {
        let diagnostics = checker::check_unit(corpus, unit);
        if !diagnostics.is_empty() {
            debug!(
                unit = corpus.unit_name(unit),
                count = diagnostics.len(),
                first = %diagnostics[0],
                "compile check failed"
            );
            return false;
        }

        // The printed form must parse again; a unit we cannot round-trip is
        // not compilable no matter what the tree looks like.
        let printed = printer::print(corpus, unit);
        let mut scratch = Corpus::new();
        match parser::parse_file(&mut scratch, &printed) {
            Ok(_) => true,
            Err(err) => {
                debug!(unit = corpus.unit_name(unit), error = %err, "re-parse failed");
                false
            }
        }
    }

    fn file_extension(&self) -> &'static str {
        SOURCE_EXTENSION
    }

    fn refresh_use_headers(&self, corpus: &mut Corpus, unit: NodeId) {
        let arena = corpus.arena();
        let mut needed: Vec<String> = arena
            .find_descendants(unit, SyntaxKind::Call)
            .into_iter()
            .filter_map(|call| arena.text(call).map(str::to_string))
            .filter(|name| checker::is_builtin(name))
            .collect();
        needed.sort();
        needed.dedup();

        let existing = arena.find_descendants(unit, SyntaxKind::UseHeader);
        let arena = corpus.arena_mut();
        for header in existing {
            arena.detach(header);
        }
        for (index, name) in needed.iter().enumerate() {
            let header = arena.alloc(SyntaxKind::UseHeader, Some(name.clone()));
            arena.insert_child(unit, index, header);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_dir_is_sorted_and_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mu"), "unit B { fn f() { } }").unwrap();
        fs::write(dir.path().join("a.mu"), "unit A { fn g() { } }").unwrap();
        fs::write(dir.path().join("ignored.txt"), "not source").unwrap();

        let provider = LangProvider::new();
        let corpus = provider.parse_dir(dir.path()).unwrap();
        let names: Vec<&str> = corpus
            .units()
            .iter()
            .map(|unit| corpus.unit_name(*unit))
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn parse_dir_missing_directory_is_io_error() {
        let provider = LangProvider::new();
        let err = provider.parse_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ProviderError::Io { .. }));
    }

    #[test]
    fn compile_check_accepts_valid_unit() {
        let provider = LangProvider::new();
        let mut corpus = Corpus::new();
        let units = provider
            .parse_source(
                &mut corpus,
                "test.mu",
                "use std.print;\nunit A { fn f(x) { print(x); } }",
            )
            .unwrap();
        assert!(provider.compile_check(&corpus, units[0]));
    }

    #[test]
    fn compile_check_rejects_unresolved_names() {
        let provider = LangProvider::new();
        let mut corpus = Corpus::new();
        let units = provider
            .parse_source(&mut corpus, "test.mu", "unit A { fn f() { return ghost; } }")
            .unwrap();
        assert!(!provider.compile_check(&corpus, units[0]));
    }

    #[test]
    fn refresh_use_headers_tracks_builtin_calls() {
        let provider = LangProvider::new();
        let mut corpus = Corpus::new();
        let units = provider
            .parse_source(
                &mut corpus,
                "test.mu",
                "use std.len;\nunit A { fn f(x) { print(x); } }",
            )
            .unwrap();
        let unit = units[0];

        provider.refresh_use_headers(&mut corpus, unit);

        let headers: Vec<&str> = corpus
            .arena()
            .find_descendants(unit, SyntaxKind::UseHeader)
            .into_iter()
            .filter_map(|id| corpus.arena().text(id))
            .collect();
        assert_eq!(headers, vec!["print"]);
        assert!(provider.compile_check(&corpus, unit));
    }
}
