//! Results of the counting and promotion engines
//!
//! Statistics keep insertion order: names requested by the caller come first,
//! in request order, followed by names discovered while walking documents.

use crate::error::{Error, Result};
use crate::workspace::Project;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Occurrence count of one using directive name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsingDirective {
    pub name: String,
    pub occurrences: usize,
}

impl UsingDirective {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            occurrences: 0,
        }
    }
}

impl fmt::Display for UsingDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.occurrences)
    }
}

/// Insertion-ordered statistics keyed by directive name (ordinal)
#[derive(Debug, Clone, Default)]
struct UsingStatistics {
    entries: IndexMap<String, UsingDirective>,
}

impl UsingStatistics {
    fn add_range<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            if !self.entries.contains_key(name) {
                self.entries
                    .insert(name.to_string(), UsingDirective::new(name));
            }
        }
    }

    fn increment_or_add(&mut self, name: &str) {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| UsingDirective::new(name))
            .occurrences += 1;
    }

    fn increment(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(directive) => {
                directive.occurrences += 1;
                true
            }
            None => false,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &UsingDirective> {
        self.entries.values()
    }

    fn get(&self, name: &str) -> Option<&UsingDirective> {
        self.entries.get(name)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn total(&self) -> usize {
        self.iter().map(|directive| directive.occurrences).sum()
    }
}

impl Serialize for UsingStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Result of [`count`](super::count)
#[derive(Debug, Clone, Serialize)]
pub struct UsingCountResult {
    project_name: String,
    usings: UsingStatistics,
}

impl UsingCountResult {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            usings: UsingStatistics::default(),
        }
    }

    /// Seed names at zero occurrences. Names already present are kept as is.
    pub fn add_range<S: AsRef<str>>(&mut self, names: &[S]) {
        self.usings.add_range(names);
    }

    pub fn increment_or_add(&mut self, name: &str) {
        self.usings.increment_or_add(name);
    }

    /// Increment an existing name. Returns `false` for unknown names.
    pub fn increment(&mut self, name: &str) -> bool {
        self.usings.increment(name)
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn usings(&self) -> impl Iterator<Item = &UsingDirective> {
        self.usings.iter()
    }

    pub fn get(&self, name: &str) -> Option<&UsingDirective> {
        self.usings.get(name)
    }

    pub fn len(&self) -> usize {
        self.usings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usings.len() == 0
    }
}

/// Result of [`globalize`](super::globalize)
#[derive(Debug, Clone, Serialize)]
pub struct UsingGlobalizationResult {
    project_name: String,
    usings: UsingStatistics,
    occurrences: usize,
    target_document: String,
    #[serde(skip_serializing)]
    project: Project,
    #[serde(skip_serializing)]
    filtered: bool,
}

impl UsingGlobalizationResult {
    pub fn new(project: &Project, target_document: impl Into<String>) -> Self {
        Self {
            project_name: project.name().to_string(),
            usings: UsingStatistics::default(),
            occurrences: 0,
            target_document: target_document.into(),
            project: project.clone(),
            filtered: false,
        }
    }

    /// Seed the requested names. With a non-empty request, no other name can
    /// be recorded afterwards.
    pub fn initialize<S: AsRef<str>>(&mut self, names: &[S]) {
        self.usings.add_range(names);
        self.filtered = !names.is_empty();
    }

    /// Record the names removed from one document, duplicates included
    pub fn update<S: AsRef<str>>(&mut self, identifiers: &[S]) -> Result<()> {
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            if !self.filtered {
                self.usings.increment_or_add(identifier);
            } else if !self.usings.increment(identifier) {
                return Err(Error::InvariantViolation(format!(
                    "using directive '{}' was globalized but not requested",
                    identifier
                )));
            }
        }
        self.occurrences += identifiers.len();
        Ok(())
    }

    /// Replace the project reference with the final snapshot
    pub fn update_project(&mut self, project: Project) {
        self.project = project;
    }

    /// Check that the statistics account for every removed directive
    pub fn verify(&self) -> Result<()> {
        let total = self.usings.total();
        if total != self.occurrences {
            return Err(Error::InvariantViolation(format!(
                "statistics sum to {} occurrences, but {} directives were globalized",
                total, self.occurrences
            )));
        }
        Ok(())
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn usings(&self) -> impl Iterator<Item = &UsingDirective> {
        self.usings.iter()
    }

    pub fn get(&self, name: &str) -> Option<&UsingDirective> {
        self.usings.get(name)
    }

    pub fn len(&self) -> usize {
        self.usings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usings.len() == 0
    }

    /// Total number of directives removed from documents
    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    pub fn target_document(&self) -> &str {
        &self.target_document
    }

    /// Final project snapshot
    pub fn project(&self) -> &Project {
        &self.project
    }
}
