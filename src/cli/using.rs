//! Using directive commands

use super::project::resolve_project_file;
use crate::cancel::CancellationToken;
use crate::config::{load_project_config, ProjectConfig};
use crate::usings::{self, UsingCountResult, UsingGlobalizationResult};
use crate::workspace::commit::{commit, CommitOptions, CommitSummary};
use crate::workspace::loader::load_project;
use crate::workspace::Project;
use anyhow::{bail, Context, Result};
use console::style;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Flags of the globalize command
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalizeFlags {
    pub force: bool,
    pub dry_run: bool,
    pub add_compile_item: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Command line first, then `[defaults] format`, then text
    fn resolve(flag: Option<&str>, config: &ProjectConfig) -> Self {
        match flag.or(config.defaults.format.as_deref()) {
            Some(format) if format.eq_ignore_ascii_case("json") => OutputFormat::Json,
            Some(format) if !format.eq_ignore_ascii_case("text") => {
                warn!("Unknown output format '{}', using text", format);
                OutputFormat::Text
            }
            _ => OutputFormat::Text,
        }
    }
}

/// Run `using count`
pub fn count(usings: &[String], project: Option<&Path>, format: Option<&str>) -> Result<()> {
    let (project, config) = open_project(project)?;
    let format = OutputFormat::resolve(format, &config);
    let cancel = install_cancel_handler()?;

    let result = match usings::count(&project, usings, &cancel) {
        Ok(result) => result,
        Err(e) if e.is_canceled() => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(report(e)),
    };

    match format {
        OutputFormat::Text => print!("{}", render_count(&result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

/// Run `using globalize`
pub fn globalize(
    usings: &[String],
    project: Option<&Path>,
    format: Option<&str>,
    flags: GlobalizeFlags,
) -> Result<()> {
    if usings.is_empty() && !flags.force {
        bail!(
            "No usings specified. To globalize all top-level using directives, run the command with '--force' option."
        );
    }

    let (project, config) = open_project(project)?;
    let format = OutputFormat::resolve(format, &config);
    let cancel = install_cancel_handler()?;

    let result = match usings::globalize(&project, usings, &cancel) {
        Ok(result) => result,
        Err(e) if e.is_canceled() => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(report(e)),
    };

    let summary = if flags.dry_run {
        info!("Dry run: no files written");
        CommitSummary::default()
    } else {
        let options = CommitOptions {
            add_compile_items: flags.add_compile_item || config.commit.add_compile_items,
        };
        commit(&project, result.project(), options)?
    };

    match format {
        OutputFormat::Text => {
            print!("{}", render_globalization(&result));
            if flags.dry_run {
                println!("{}", style("Dry run: no files were written.").dim());
            } else {
                print_summary(result.project(), &summary);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn open_project(explicit: Option<&Path>) -> Result<(Project, ProjectConfig)> {
    let working_dir = std::env::current_dir().context("Failed to read the current directory")?;
    let project_file = resolve_project_file(explicit, &working_dir)?;
    debug!("Using project file {}", project_file.display());

    let project_dir = project_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(&working_dir);
    let config = load_project_config(project_dir);
    let project = load_project(&project_file, &config)?;
    Ok((project, config))
}

fn install_cancel_handler() -> Result<CancellationToken> {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    ctrlc::set_handler(move || handle.cancel()).context("Failed to set Ctrl+C handler")?;
    Ok(cancel)
}

fn report(e: crate::Error) -> anyhow::Error {
    if e.is_defect() {
        error!("{}. This is a bug in csusing.", e);
    }
    e.into()
}

fn render_count(result: &UsingCountResult) -> String {
    let mut out = format!("Project: {}\n", result.project_name());
    for using in result.usings() {
        out.push_str(&format!("  {using}\n"));
    }
    out
}

fn render_globalization(result: &UsingGlobalizationResult) -> String {
    let single = match result.len() {
        1 => result.usings().next(),
        _ => None,
    };
    let target = result.target_document();

    let message = match (result.occurrences(), single) {
        (0, Some(using)) => format!(
            "No occurrences of Using Directive \"{}\" were globalized.",
            using.name
        ),
        (0, None) => format!(
            "No occurrences of {} Using Directives were globalized.",
            result.len()
        ),
        (1, Some(using)) => format!(
            "1 occurrence of Using Directive \"{}\" was globalized to \"{target}\".",
            using.name
        ),
        (1, None) => format!(
            "1 occurrence of {} Using Directives was globalized to \"{target}\".",
            result.len()
        ),
        (n, Some(using)) => format!(
            "{n} occurrences of Using Directive \"{}\" were globalized to \"{target}\".",
            using.name
        ),
        (n, None) => format!(
            "{n} occurrences of {} Using Directives were globalized to \"{target}\".",
            result.len()
        ),
    };
    format!("Project: {}\n{message}\n", result.project_name())
}

fn print_summary(project: &Project, summary: &CommitSummary) {
    let directory = project.directory();
    let relative = |path: &Path| {
        directory
            .and_then(|dir| path.strip_prefix(dir).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    };
    for path in &summary.added {
        eprintln!("{} {}", style("+").green(), style(relative(path)).cyan());
    }
    for path in &summary.changed {
        eprintln!("{} {}", style("~").yellow(), relative(path));
    }
    if summary.project_file_updated {
        if let Some(file) = project.file_path() {
            eprintln!("{} {}", style("~").yellow(), relative(file));
        }
    }
}
