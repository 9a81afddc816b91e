//! Configuration module for csusing
//!
//! This module handles project-level configuration (`csusing.toml`):
//! - Extra generated-code patterns
//! - Commit options for legacy project files
//! - CLI defaults

mod project_config;

pub use project_config::{
    load_project_config, CliDefaults, CommitConfig, GeneratedConfig, ProjectConfig,
    CONFIG_FILE_NAME,
};
