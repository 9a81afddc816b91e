//! Error kinds reported by the using-directive engines
//!
//! Precondition failures (`UnsupportedLanguage`, `NoCompilation`) are raised
//! before any document is touched. Per-document failures abort the whole
//! operation, so no partially edited snapshot ever leaves an engine.

use thiserror::Error;

/// Errors that can occur while analyzing or rewriting a project
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot open project '{project}' because the language '{language}' is not supported.")]
    UnsupportedLanguage { project: String, language: String },

    #[error("Project '{project}' uses C# {actual}, but '{feature}' requires C# {required} or later.")]
    UnsupportedLanguageVersion {
        project: String,
        feature: &'static str,
        actual: String,
        required: String,
    },

    #[error("Project '{project}' does not support compilation.")]
    NoCompilation { project: String },

    #[error("Document '{document}' does not support a syntax tree.")]
    MissingSyntaxTree { document: String },

    #[error("Document '{document}' contains syntax errors (line {line}, column {column}).")]
    SyntaxError {
        document: String,
        line: usize,
        column: usize,
    },

    /// A post-hoc consistency check failed. This is a defect in the engine,
    /// never a usage error.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// Cooperative cancellation. Not a failure: hosts report it separately.
    #[error("Operation canceled.")]
    Canceled,
}

impl Error {
    /// Whether this is a cancellation rather than a failure
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }

    /// Whether this signals a defect in the engine itself
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            Error::InvariantViolation(_) | Error::MissingSyntaxTree { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
