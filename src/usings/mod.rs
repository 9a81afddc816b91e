//! Using directive analysis and promotion
//!
//! - [`counter`] aggregates occurrence counts of local using directives
//! - [`globalizer`] moves local using directives into a shared
//!   `GlobalUsings.cs` as `global using` directives
//!
//! Both engines walk the documents of a project in enumeration order, skip
//! generated documents, and abort the whole operation on the first document
//! with syntax errors. They never print or log: results and errors are
//! returned to the host.

pub mod classifier;
pub mod counter;
pub mod globalizer;
pub mod result;

pub use classifier::{is_local, local_usings};
pub use counter::count;
pub use globalizer::{globalize, DEFAULT_TARGET_DOCUMENT};
pub use result::{UsingCountResult, UsingDirective, UsingGlobalizationResult};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::workspace::generated::has_generated_header;
use crate::workspace::syntax::SyntaxTree;
use crate::workspace::{Compilation, Document, Language, Project};
use std::sync::Arc;

/// Language and compilation preconditions shared by both engines
fn compilation_for(project: &Project) -> Result<Compilation> {
    if project.language() != Language::CSharp {
        return Err(Error::UnsupportedLanguage {
            project: project.name().to_string(),
            language: project.language().to_string(),
        });
    }

    project.compilation().ok_or_else(|| Error::NoCompilation {
        project: project.name().to_string(),
    })
}

/// Tree of a document that takes part in the operation.
///
/// `Ok(None)` for generated documents. A document with syntax errors fails
/// the operation, and cancellation is observed once per document.
fn eligible_tree(document: &Document, cancel: &CancellationToken) -> Result<Option<Arc<SyntaxTree>>> {
    if document.is_generated() {
        return Ok(None);
    }

    let tree = document
        .syntax_tree()
        .ok_or_else(|| Error::MissingSyntaxTree {
            document: document.name().to_string(),
        })?;

    if has_generated_header(&tree) {
        return Ok(None);
    }

    ensure_no_errors(document, &tree)?;
    cancel.check()?;

    Ok(Some(tree))
}

fn ensure_no_errors(document: &Document, tree: &SyntaxTree) -> Result<()> {
    if !tree.has_errors() {
        return Ok(());
    }
    match tree.first_error() {
        Some((line, column)) => Err(Error::SyntaxError {
            document: document.name().to_string(),
            line,
            column,
        }),
        None => Ok(()),
    }
}

/// Ordinal membership in a caller-supplied filter
fn contains<S: AsRef<str>>(usings: &[S], name: &str) -> bool {
    usings.iter().any(|using| using.as_ref() == name)
}
