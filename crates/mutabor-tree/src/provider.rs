//! The external parser/printer/checker capability surface.

use std::path::Path;

use crate::arena::NodeId;
use crate::corpus::Corpus;
use crate::error::Result;

/// Capability surface of the source-language tooling the engine and the
/// policies depend on.
///
/// The scheduling core never depends on a concrete parser; anything that can
/// load units into a [`Corpus`], print a subtree back to text, and answer a
/// structural compile check can drive a run.
pub trait AstProvider: Send + Sync {
    /// Parse every source file under `dir` into a fresh corpus.
    ///
    /// File discovery must be deterministic (sorted), so that identical
    /// corpora parse into identical arenas.
    fn parse_dir(&self, dir: &Path) -> Result<Corpus>;

    /// Parse a single source text and append its units to `corpus`,
    /// returning the new unit ids. Mainly a test convenience.
    fn parse_source(&self, corpus: &mut Corpus, file: &str, text: &str) -> Result<Vec<NodeId>>;

    /// Render the subtree rooted at `node` back to source text.
    fn pretty_print(&self, corpus: &Corpus, node: NodeId) -> Result<String>;

    /// Structural validation of one unit. `false` means the unit would not
    /// compile; callers revert and retry, they do not abort.
    fn compile_check(&self, corpus: &Corpus, unit: NodeId) -> bool;

    /// Recompute the unit's use headers from the builtin calls it actually
    /// makes. Policies with use-header management enabled call this after
    /// every mutation.
    fn refresh_use_headers(&self, corpus: &mut Corpus, unit: NodeId);

    /// File extension for pretty-printed output files, without the dot.
    fn file_extension(&self) -> &'static str;
}
