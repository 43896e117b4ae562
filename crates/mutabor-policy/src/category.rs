//! Semantic effect/domain labels carried by every applied mutation.

use serde::{Deserialize, Serialize};

/// Category labels attached to transformations.
///
/// Two groups: the effect on the tree (`Structure`, `Comment`, `Naming`,
/// `ControlFlow`, `Smell`) and the downstream domain likely to notice
/// (`Nlp`, `Bytecode`, `Testing`). Extending this enum is safe; categories
/// are only used for labelling the manifest and for selection diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Likely to affect natural-language-based tooling.
    Nlp,
    /// Changes the pre-compilation control flow.
    ControlFlow,
    /// Changes the structure of the code.
    Structure,
    /// Adds, removes or alters comments.
    Comment,
    /// Changes occurring names.
    Naming,
    /// Likely to change generated code.
    Bytecode,
    /// Likely to affect test-related tooling.
    Testing,
    /// Introduces a deliberate code smell.
    Smell,
}

impl Category {
    /// The lowercase label stored in the manifest.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Nlp => "nlp",
            Category::ControlFlow => "controlflow",
            Category::Structure => "structure",
            Category::Comment => "comment",
            Category::Naming => "naming",
            Category::Bytecode => "bytecode",
            Category::Testing => "testing",
            Category::Smell => "smell",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_lowercase() {
        assert_eq!(Category::ControlFlow.to_string(), "controlflow");
        assert_eq!(Category::Smell.to_string(), "smell");
    }
}
