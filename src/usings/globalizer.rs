//! Promotion of local using directives to global using directives
//!
//! Documents are processed one at a time against the cumulative snapshot, so
//! the target document created for the first document is found and extended
//! by the following ones.

use super::result::UsingGlobalizationResult;
use super::{classifier, compilation_for, contains, eligible_tree, ensure_no_errors};
use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::workspace::syntax::{self, SyntaxTree};
use crate::workspace::{Document, DocumentId, LanguageVersion, Project};

/// Name of the shared global usings document at the project root
pub const DEFAULT_TARGET_DOCUMENT: &str = "GlobalUsings.cs";

const GLOBAL_USING_FEATURE: &str = "global using directive";

/// Move local top-level using directives into `GlobalUsings.cs`.
///
/// With an empty `usings` filter every local directive is promoted. The
/// returned result holds the final snapshot; nothing is written to disk.
pub fn globalize<S: AsRef<str>>(
    project: &Project,
    usings: &[S],
    cancel: &CancellationToken,
) -> Result<UsingGlobalizationResult> {
    let compilation = compilation_for(project)?;

    let version = project.language_version();
    if !version.supports_global_using_directives() {
        return Err(Error::UnsupportedLanguageVersion {
            project: project.name().to_string(),
            feature: GLOBAL_USING_FEATURE,
            actual: version.to_string(),
            required: LanguageVersion::CSHARP_10.to_string(),
        });
    }

    let mut result = UsingGlobalizationResult::new(project, DEFAULT_TARGET_DOCUMENT);
    result.initialize(usings);

    if compilation.is_generated() {
        return Ok(result);
    }

    let mut snapshot = project.clone();
    for id in project.document_ids() {
        let document = current_document(&snapshot, id)?.clone();
        let Some(tree) = eligible_tree(&document, cancel)? else {
            continue;
        };
        snapshot = globalize_document(snapshot, &document, &tree, usings, &mut result)?;
    }

    result.update_project(snapshot);
    result.verify()?;
    Ok(result)
}

fn current_document(snapshot: &Project, id: DocumentId) -> Result<&Document> {
    snapshot.document(id).ok_or_else(|| {
        Error::InvariantViolation(format!(
            "document {:?} is not part of project '{}'",
            id,
            snapshot.name()
        ))
    })
}

fn globalize_document<S: AsRef<str>>(
    snapshot: Project,
    document: &Document,
    tree: &SyntaxTree,
    usings: &[S],
    result: &mut UsingGlobalizationResult,
) -> Result<Project> {
    let globalized: Vec<_> = classifier::local_usings(tree)
        .into_iter()
        .filter(|using| usings.is_empty() || contains(usings, &using.name))
        .collect();
    if globalized.is_empty() {
        return Ok(snapshot);
    }

    let identifiers: Vec<String> = globalized.iter().map(|using| using.name.clone()).collect();
    let ranges: Vec<_> = globalized.iter().map(|using| using.range.clone()).collect();

    result.update(&identifiers)?;

    let snapshot = snapshot
        .with_document_text(document.id(), tree.remove_usings(&ranges))
        .ok_or_else(|| {
            Error::InvariantViolation(format!(
                "document '{}' vanished from the snapshot",
                document.name()
            ))
        })?;

    let newline = tree.newline();
    match snapshot.root_document(DEFAULT_TARGET_DOCUMENT).cloned() {
        Some(target) => extend_target(snapshot, &target, &identifiers, newline),
        None => Ok(create_target(snapshot, &identifiers, newline)),
    }
}

fn extend_target(
    snapshot: Project,
    target: &Document,
    identifiers: &[String],
    newline: &str,
) -> Result<Project> {
    let tree = target
        .syntax_tree()
        .ok_or_else(|| Error::MissingSyntaxTree {
            document: target.name().to_string(),
        })?;
    ensure_no_errors(target, &tree)?;

    let existing: Vec<String> = tree
        .usings()
        .into_iter()
        .filter(|using| using.is_global && !using.is_static && !using.has_alias)
        .map(|using| using.name)
        .collect();

    let added = distinct(identifiers.iter().filter(|name| !existing.contains(*name)));
    if added.is_empty() {
        return Ok(snapshot);
    }

    let text = tree.append_global_usings(&added, newline);
    snapshot
        .with_document_text(target.id(), text)
        .ok_or_else(|| {
            Error::InvariantViolation(format!(
                "target document '{}' vanished from the snapshot",
                target.name()
            ))
        })
}

fn create_target(snapshot: Project, identifiers: &[String], newline: &str) -> Project {
    let added = distinct(identifiers.iter());
    let mut document = Document::new(
        DEFAULT_TARGET_DOCUMENT,
        syntax::global_usings_root(&added, newline),
    );
    if let Some(directory) = snapshot.directory() {
        document = document.with_file_path(directory.join(DEFAULT_TARGET_DOCUMENT));
    }
    snapshot.add_document(document)
}

/// Ordinal de-duplication keeping first-seen order
fn distinct<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if !seen.contains(&name.as_str()) {
            seen.push(name);
        }
    }
    seen
}
