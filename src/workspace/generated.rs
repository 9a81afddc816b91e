//! Generated-code detection
//!
//! Generated documents are skipped entirely by the engines. A document is
//! generated when its file name follows a code generator convention, when it
//! matches a configured pattern, or when its header comment says so.

use super::syntax::SyntaxTree;
use glob::Pattern;
use std::path::Path;

const GENERATED_SUFFIXES: &[&str] = &[".designer.cs", ".generated.cs", ".g.cs", ".g.i.cs"];
const GENERATED_PREFIX: &str = "temporarygeneratedfile_";
const GENERATED_MARKERS: &[&str] = &["<autogenerated", "<auto-generated"];

/// Whether a file name follows a generated-code naming convention
pub fn is_generated_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with(GENERATED_PREFIX)
        || GENERATED_SUFFIXES
            .iter()
            .any(|suffix| lower.ends_with(suffix))
}

/// Whether the header comment of a tree marks it as generated
pub fn has_generated_header(tree: &SyntaxTree) -> bool {
    tree.leading_comments().iter().any(|comment| {
        GENERATED_MARKERS
            .iter()
            .any(|marker| comment.contains(marker))
    })
}

/// Compile glob patterns, warning about and skipping invalid ones.
/// `kind` names the source of the patterns in the warning.
pub fn compile_globs<S: AsRef<str>>(patterns: &[S], kind: &str) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern.as_ref()) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!("Ignoring {} '{}': {}", kind, pattern.as_ref(), e);
                None
            }
        })
        .collect()
}

/// Additional generated-code patterns, relative to the project directory
#[derive(Debug, Clone, Default)]
pub struct GeneratedPatterns {
    patterns: Vec<Pattern>,
}

impl GeneratedPatterns {
    /// Compile glob patterns, skipping invalid ones
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: compile_globs(patterns, "generated-code pattern"),
        }
    }

    pub fn matches(&self, relative_path: &Path) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
