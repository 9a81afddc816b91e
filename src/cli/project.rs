//! Project file discovery

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the project file to operate on.
///
/// An explicit path must exist; a directory is searched like the working
/// directory. Without a path the working directory must hold exactly one
/// project file.
pub fn resolve_project_file(explicit: Option<&Path>, working_dir: &Path) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.is_dir() => find_project_file(path),
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => bail!("File does not exist: '{}'.", path.display()),
        None => find_project_file(working_dir),
    }
}

fn find_project_file(dir: &Path) -> Result<PathBuf> {
    let pattern = format!(
        "{}/*.*proj",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    debug!("Searching project files: {}", pattern);

    let mut candidates: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => bail!(
            "Specify a project file. The current working directory does not contain a project file."
        ),
        1 => Ok(candidates.remove(0)),
        _ => bail!(
            "Specify which project file to use because this folder contains more than one project file."
        ),
    }
}
