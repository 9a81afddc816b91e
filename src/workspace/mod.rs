//! Immutable project snapshots
//!
//! A [`Project`] is a value: every edit returns a new project sharing the
//! unmodified documents with the old one. Document and project identifiers
//! are assigned at creation and survive edits, so two snapshots can be
//! compared slot by slot.
//!
//! This module also provides the source side (loading a project file from
//! disk, see [`loader`]) and the storage side ([`commit`]) of a snapshot.

pub mod commit;
pub mod generated;
pub mod loader;
pub mod syntax;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use self::syntax::{SyntaxTree, DEFAULT_PREPROCESSOR_SYMBOLS};

/// Stable identity of a project across edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable identity of a document slot across edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Source language of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    CSharp,
    VisualBasic,
    FSharp,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::CSharp => "C#",
            Language::VisualBasic => "Visual Basic",
            Language::FSharp => "F#",
        };
        f.write_str(name)
    }
}

/// C# language version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    major: u8,
    minor: u8,
}

impl LanguageVersion {
    pub const CSHARP_7_3: Self = Self::new(7, 3);
    pub const CSHARP_8: Self = Self::new(8, 0);
    pub const CSHARP_9: Self = Self::new(9, 0);
    /// First version with global using directives
    pub const CSHARP_10: Self = Self::new(10, 0);
    pub const CSHARP_11: Self = Self::new(11, 0);
    pub const CSHARP_12: Self = Self::new(12, 0);
    pub const CSHARP_13: Self = Self::new(13, 0);
    pub const CSHARP_14: Self = Self::new(14, 0);
    pub const LATEST: Self = Self::CSHARP_14;

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Parse a `<LangVersion>` value. `default` and unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "latest" | "latestmajor" | "preview" => Some(Self::LATEST),
            "iso-1" => Some(Self::new(1, 0)),
            "iso-2" => Some(Self::new(2, 0)),
            "default" | "" => None,
            _ => {
                let (major, minor) = value.split_once('.').unwrap_or((value.as_str(), "0"));
                Some(Self::new(major.parse().ok()?, minor.parse().ok()?))
            }
        }
    }

    /// Default C# version the SDK picks for a target framework moniker
    pub fn for_target_framework(tfm: &str) -> Self {
        let tfm = tfm.trim().to_ascii_lowercase();
        // Platform suffixes such as `net8.0-windows` do not change the default
        let tfm = tfm.split('-').next().unwrap_or_default();

        if let Some(version) = tfm.strip_prefix("netcoreapp") {
            return if version.starts_with('3') {
                Self::CSHARP_8
            } else {
                Self::CSHARP_7_3
            };
        }
        if let Some(version) = tfm.strip_prefix("netstandard") {
            return if version.starts_with("2.1") {
                Self::CSHARP_8
            } else {
                Self::CSHARP_7_3
            };
        }
        if let Some(version) = tfm.strip_prefix("net") {
            // net5.0 and later carry a dot; net48 style monikers are .NET Framework
            if let Some((major, _)) = version.split_once('.') {
                if let Ok(major) = major.parse::<u8>() {
                    if major >= 5 {
                        return Self::new(major.saturating_add(4).min(Self::LATEST.major), 0);
                    }
                }
            }
        }
        Self::CSHARP_7_3
    }

    pub fn supports_global_using_directives(&self) -> bool {
        *self >= Self::CSHARP_10
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// How a project file declares its documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    /// `<Project Sdk="...">`: documents come from default globs
    SdkStyle,
    /// Explicit `<Compile Include>` item lists
    Legacy,
}

struct DocumentState {
    text: Arc<str>,
    tree: OnceLock<Option<Arc<SyntaxTree>>>,
}

impl fmt::Debug for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentState")
            .field("len", &self.text.len())
            .field("parsed", &self.tree.get().is_some())
            .finish()
    }
}

/// A source document snapshot
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    name: String,
    folders: Vec<String>,
    file_path: Option<PathBuf>,
    generated: bool,
    utf8_bom: bool,
    symbols: Arc<[String]>,
    state: Arc<DocumentState>,
}

fn default_symbols() -> Arc<[String]> {
    DEFAULT_PREPROCESSOR_SYMBOLS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            folders: Vec::new(),
            file_path: None,
            generated: false,
            utf8_bom: false,
            symbols: default_symbols(),
            state: Arc::new(DocumentState {
                text: text.into(),
                tree: OnceLock::new(),
            }),
        }
    }

    /// Place the document in a folder path relative to the project directory
    pub fn in_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.folders = folders.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Mark the document as generated regardless of its name or header
    pub fn generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    /// Whether the file on disk starts with a UTF-8 byte order mark.
    /// The mark is not part of [`text`](Self::text).
    pub fn with_utf8_bom(mut self, bom: bool) -> Self {
        self.utf8_bom = bom;
        self
    }

    /// Preprocessor symbols the document is parsed with
    pub fn with_preprocessor_symbols(mut self, symbols: impl Into<Arc<[String]>>) -> Self {
        self.symbols = symbols.into();
        self.state = Arc::new(DocumentState {
            text: Arc::clone(&self.state.text),
            tree: OnceLock::new(),
        });
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_utf8_bom(&self) -> bool {
        self.utf8_bom
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn preprocessor_symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Generated by explicit flag or by file naming convention.
    ///
    /// Header comments are checked on the tree, see
    /// [`generated::has_generated_header`].
    pub fn is_generated(&self) -> bool {
        self.generated || generated::is_generated_file_name(&self.name)
    }

    /// Syntax tree of the document, parsed on first access
    pub fn syntax_tree(&self) -> Option<Arc<SyntaxTree>> {
        self.state
            .tree
            .get_or_init(|| {
                SyntaxTree::parse_with_symbols(Arc::clone(&self.state.text), &self.symbols)
                    .map(Arc::new)
            })
            .clone()
    }

    /// Same slot, new text
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self {
            state: Arc::new(DocumentState {
                text: text.into(),
                tree: OnceLock::new(),
            }),
            ..self.clone()
        }
    }

    /// Whether both values hold the same snapshot of the slot
    pub fn same_snapshot(&self, other: &Document) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.state, &other.state)
    }

    /// Path relative to the project directory
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.folders.iter().collect();
        path.push(&self.name);
        path
    }
}

/// Compiled representation of a project
#[derive(Debug, Clone)]
pub struct Compilation {
    generated: bool,
}

impl Compilation {
    /// Whether the whole compilation is generated code
    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

/// An immutable project snapshot
#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    name: String,
    language: Language,
    language_version: LanguageVersion,
    format: ProjectFormat,
    file_path: Option<PathBuf>,
    supports_compilation: bool,
    generated: bool,
    preprocessor_symbols: Arc<[String]>,
    documents: Vec<Document>,
}

impl Project {
    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn language_version(&self) -> LanguageVersion {
        self.language_version
    }

    pub fn format(&self) -> ProjectFormat {
        self.format
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Directory holding the project file
    pub fn directory(&self) -> Option<&Path> {
        self.file_path.as_deref().and_then(Path::parent)
    }

    /// Symbols defined for conditional compilation
    pub fn preprocessor_symbols(&self) -> &[String] {
        &self.preprocessor_symbols
    }

    /// Documents in enumeration order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(Document::id).collect()
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|document| document.id == id)
    }

    /// The single document with this name directly in the project directory
    pub fn root_document(&self, name: &str) -> Option<&Document> {
        let mut matches = self
            .documents
            .iter()
            .filter(|document| document.name == name && document.folders.is_empty());
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }

    pub fn compilation(&self) -> Option<Compilation> {
        self.supports_compilation.then_some(Compilation {
            generated: self.generated,
        })
    }

    /// New snapshot with the text of one document replaced.
    /// Returns `None` if the document is not part of this project.
    pub fn with_document_text(&self, id: DocumentId, text: impl Into<Arc<str>>) -> Option<Self> {
        let index = self.documents.iter().position(|document| document.id == id)?;
        let mut documents = self.documents.clone();
        documents[index] = documents[index].with_text(text);
        Some(Self {
            documents,
            ..self.clone()
        })
    }

    /// New snapshot with a document appended, parsed with the project's symbols
    pub fn add_document(&self, document: Document) -> Self {
        let mut documents = self.documents.clone();
        documents.push(document.with_preprocessor_symbols(Arc::clone(&self.preprocessor_symbols)));
        Self {
            documents,
            ..self.clone()
        }
    }
}

/// Builder for in-memory projects
#[derive(Debug)]
pub struct ProjectBuilder {
    name: String,
    language: Language,
    language_version: LanguageVersion,
    format: ProjectFormat,
    file_path: Option<PathBuf>,
    supports_compilation: bool,
    generated: bool,
    preprocessor_symbols: Arc<[String]>,
    documents: Vec<Document>,
}

impl ProjectBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: Language::CSharp,
            language_version: LanguageVersion::LATEST,
            format: ProjectFormat::SdkStyle,
            file_path: None,
            supports_compilation: true,
            generated: false,
            preprocessor_symbols: default_symbols(),
            documents: Vec::new(),
        }
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    pub fn format(mut self, format: ProjectFormat) -> Self {
        self.format = format;
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn supports_compilation(mut self, supported: bool) -> Self {
        self.supports_compilation = supported;
        self
    }

    pub fn generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    /// Defined preprocessor symbols, applied to every document at build time
    pub fn preprocessor_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preprocessor_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    pub fn build(self) -> Project {
        let symbols = self.preprocessor_symbols;
        let documents = self
            .documents
            .into_iter()
            .map(|document| document.with_preprocessor_symbols(Arc::clone(&symbols)))
            .collect();
        Project {
            id: ProjectId::new(),
            name: self.name,
            language: self.language,
            language_version: self.language_version,
            format: self.format,
            file_path: self.file_path,
            supports_compilation: self.supports_compilation,
            generated: self.generated,
            preprocessor_symbols: symbols,
            documents,
        }
    }
}
