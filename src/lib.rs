//! csusing - C# using directive tooling
//!
//! Counts the top-level using directives of a C# project and promotes them
//! to global using directives in a shared `GlobalUsings.cs` document.
//!
//! The analysis engines ([`usings::count`], [`usings::globalize`]) work on
//! immutable [`workspace::Project`] snapshots and never touch the disk.
//! [`workspace::loader`] and [`workspace::commit`] move snapshots between
//! the file system and memory.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod usings;
pub mod workspace;

pub use error::{Error, Result};
