//! CLI command definitions and handlers

mod project;
mod using;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// csusing - C# using directive tooling
#[derive(Parser, Debug)]
#[command(name = "csusing")]
#[command(
    version,
    about = "Count and globalize top-level using directives in C# projects",
    after_help = "\
Examples:
  csusing using count                          Count every using directive
  csusing using count System System.Linq       Count specific directives
  csusing using globalize System.Linq          Move System.Linq to GlobalUsings.cs
  csusing using globalize --force              Globalize every local directive
  csusing using globalize --force --dry-run    Show what would be globalized"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Output format: text, json (default: csusing.toml, then text)
    #[arg(long, short = 'f', global = true, value_parser = ["text", "json"])]
    pub format: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work with using directives
    Using {
        #[command(subcommand)]
        action: UsingCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsingCommand {
    /// Count the occurrences of top-level using directives
    Count {
        /// Using directives to count (default: all)
        usings: Vec<String>,

        /// Project file to analyze (default: the project file in the current directory)
        #[arg(long, visible_alias = "proj")]
        project: Option<PathBuf>,
    },

    /// Move top-level using directives to global using directives
    #[command(after_help = "\
The global using directives are written to GlobalUsings.cs in the project
directory. An existing GlobalUsings.cs is extended with the new directives.")]
    Globalize {
        /// Using directives to globalize
        usings: Vec<String>,

        /// Project file to modify (default: the project file in the current directory)
        #[arg(long, visible_alias = "proj")]
        project: Option<PathBuf>,

        /// Globalize every top-level using directive when none are specified
        #[arg(long)]
        force: bool,

        /// Report the result without writing any file
        #[arg(long)]
        dry_run: bool,

        /// Reference a new GlobalUsings.cs from a legacy (non-SDK) project file
        #[arg(long)]
        add_compile_item: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    match cli.command {
        Commands::Using { action } => match action {
            UsingCommand::Count { usings, project } => {
                using::count(&usings, project.as_deref(), format.as_deref())
            }
            UsingCommand::Globalize {
                usings,
                project,
                force,
                dry_run,
                add_compile_item,
            } => using::globalize(
                &usings,
                project.as_deref(),
                format.as_deref(),
                using::GlobalizeFlags {
                    force,
                    dry_run,
                    add_compile_item,
                },
            ),
        },
    }
}
