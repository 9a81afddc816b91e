//! Project-level configuration support
//!
//! Loads per-project configuration from `csusing.toml` next to the project
//! file.
//!
//! # Configuration Format
//!
//! ```toml
//! # csusing.toml
//!
//! [generated]
//! # Treated as generated code: never counted, never rewritten
//! patterns = ["Migrations/*.cs", "Generated/**/*.cs"]
//!
//! [commit]
//! # Legacy (non-SDK) projects only: reference new documents in the project file
//! add_compile_items = false
//!
//! [defaults]
//! format = "text"
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// File name of the project configuration
pub const CONFIG_FILE_NAME: &str = "csusing.toml";

/// Project configuration loaded from `csusing.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub generated: GeneratedConfig,
    pub commit: CommitConfig,
    pub defaults: CliDefaults,
}

/// Extra generated-code patterns
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneratedConfig {
    /// Glob patterns relative to the project directory
    pub patterns: Vec<String>,
}

/// Options applied when writing a globalized project back to disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Add `<Compile Include>` items for new documents of legacy projects
    pub add_compile_items: bool,
}

/// Default CLI options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliDefaults {
    /// Output format: text or json
    pub format: Option<String>,
}

/// Load project configuration from the project directory.
///
/// Returns default configuration if no config file is found or if it fails
/// to parse.
pub fn load_project_config(project_dir: &Path) -> ProjectConfig {
    let toml_path = project_dir.join(CONFIG_FILE_NAME);
    if !toml_path.exists() {
        debug!("No project config found, using defaults");
        return ProjectConfig::default();
    }

    match load_toml_config(&toml_path) {
        Ok(config) => {
            debug!("Loaded project config from {}", toml_path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", toml_path.display(), e);
            ProjectConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}
