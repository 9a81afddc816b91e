//! Writing a project snapshot back to disk
//!
//! [`commit`] compares a changed snapshot with the snapshot it was derived
//! from and writes only the documents whose text changed or that were
//! added. Every write goes through a temporary file in the target directory
//! that is renamed over the destination.

use super::{Document, Project, ProjectFormat};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const UTF8_BOM: &str = "\u{feff}";

/// Options for writing a snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    /// Reference added documents from a legacy project file
    pub add_compile_items: bool,
}

/// What a commit wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub changed: Vec<PathBuf>,
    pub added: Vec<PathBuf>,
    pub project_file_updated: bool,
}

impl CommitSummary {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && !self.project_file_updated
    }
}

struct PendingWrite {
    path: PathBuf,
    content: String,
}

/// Write the differences between `old` and `new` to disk
pub fn commit(old: &Project, new: &Project, options: CommitOptions) -> Result<CommitSummary> {
    let directory = new
        .directory()
        .context("Project has no file path; nothing to write back to")?;

    let mut summary = CommitSummary::default();
    let mut writes = Vec::new();
    let mut added_documents = Vec::new();

    for document in new.documents() {
        let path = document_path(directory, document);
        match old.document(document.id()) {
            Some(previous) if previous.same_snapshot(document) => continue,
            Some(previous) if previous.text() == document.text() => continue,
            Some(_) => summary.changed.push(path.clone()),
            None => {
                summary.added.push(path.clone());
                added_documents.push(document);
            }
        }
        writes.push(PendingWrite {
            content: encode(document),
            path,
        });
    }

    if options.add_compile_items && new.format() == ProjectFormat::Legacy && !added_documents.is_empty() {
        if let Some(project_file) = new.file_path() {
            let content = std::fs::read_to_string(project_file)
                .with_context(|| format!("Failed to read project file: {}", project_file.display()))?;
            let includes: Vec<String> = added_documents
                .iter()
                .map(|document| include_path(document))
                .collect();
            let updated = add_compile_items(&content, &includes);
            if updated != content {
                writes.push(PendingWrite {
                    path: project_file.to_path_buf(),
                    content: updated,
                });
                summary.project_file_updated = true;
            }
        }
    }

    for write in &writes {
        write_atomic(&write.path, &write.content)?;
        debug!("Wrote {}", write.path.display());
    }

    info!(
        "Committed {}: {} changed, {} added",
        new.name(),
        summary.changed.len(),
        summary.added.len()
    );
    Ok(summary)
}

fn document_path(directory: &Path, document: &Document) -> PathBuf {
    document
        .file_path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| directory.join(document.relative_path()))
}

fn encode(document: &Document) -> String {
    if document.has_utf8_bom() {
        format!("{UTF8_BOM}{}", document.text())
    } else {
        document.text().to_string()
    }
}

/// MSBuild item path, backslash separated
fn include_path(document: &Document) -> String {
    let mut parts: Vec<&str> = document.folders().iter().map(String::as_str).collect();
    parts.push(document.name());
    parts.join("\\")
}

/// Insert `<Compile Include>` items after the last existing one, or in a new
/// item group before `</Project>`.
fn add_compile_items(content: &str, includes: &[String]) -> String {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };

    let includes: Vec<&String> = includes
        .iter()
        .filter(|include| !content.contains(&format!("<Compile Include=\"{include}\"")))
        .collect();
    if includes.is_empty() {
        return content.to_string();
    }

    let mut offset = 0;
    let mut last_item: Option<(usize, String)> = None;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("<Compile ") && line.trim_end().ends_with("/>") {
            let indent = line[..line.len() - trimmed.len()].to_string();
            last_item = Some((offset + line.len(), indent));
        }
        offset += line.len();
    }

    let mut updated = content.to_string();
    match last_item {
        Some((end, indent)) => {
            let mut insertion = String::new();
            if !content[..end].ends_with('\n') {
                insertion.push_str(newline);
            }
            for include in &includes {
                insertion.push_str(&format!("{indent}<Compile Include=\"{include}\" />{newline}"));
            }
            updated.insert_str(end, &insertion);
        }
        None => {
            let Some(end) = content.rfind("</Project>") else {
                return content.to_string();
            };
            let mut group = format!("  <ItemGroup>{newline}");
            for include in &includes {
                group.push_str(&format!("    <Compile Include=\"{include}\" />{newline}"));
            }
            group.push_str(&format!("  </ItemGroup>{newline}"));
            // Keep `</Project>` on its own line
            let line_start = content[..end].rfind('\n').map_or(0, |i| i + 1);
            if content[line_start..end].trim().is_empty() {
                updated.insert_str(line_start, &group);
            } else {
                updated.insert_str(end, &format!("{newline}{group}"));
            }
        }
    }
    updated
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("Invalid document path: {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
