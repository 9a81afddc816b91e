//! Project file loading
//!
//! Reads an MSBuild project file (`.csproj`, `.vbproj`, `.fsproj`,
//! `.shproj`) and the source documents it compiles into a [`Project`]
//! snapshot. Only the properties and items that matter for using directive
//! analysis are evaluated; conditions and imported targets are ignored.

use super::generated::{compile_globs, GeneratedPatterns};
use super::syntax::DEFAULT_PREPROCESSOR_SYMBOLS;
use super::{Document, Language, LanguageVersion, Project, ProjectBuilder, ProjectFormat};
use crate::config::ProjectConfig;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

const UTF8_BOM: char = '\u{feff}';

const NETCOREAPP_VERSIONS: &[(u8, u8)] = &[(1, 0), (1, 1), (2, 0), (2, 1), (2, 2), (3, 0), (3, 1)];
const NETSTANDARD_VERSIONS: &[(u8, u8)] = &[
    (1, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (1, 6),
    (2, 0),
    (2, 1),
];
const NETFRAMEWORK_VERSIONS: &[&str] = &[
    "20", "35", "40", "45", "451", "452", "46", "461", "462", "47", "471", "472", "48", "481",
];

static SDK_ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
static SDK_ELEMENT: OnceLock<Regex> = OnceLock::new();
static COMPILE_ITEM: OnceLock<Regex> = OnceLock::new();

fn sdk_attribute() -> &'static Regex {
    SDK_ATTRIBUTE
        .get_or_init(|| Regex::new(r#"(?s)<Project\b[^>]*\bSdk\s*=\s*""#).expect("valid regex"))
}

fn sdk_element() -> &'static Regex {
    SDK_ELEMENT.get_or_init(|| {
        Regex::new(r#"<(?:Sdk\s+Name|Import\b[^>]*\bSdk)\s*=\s*""#).expect("valid regex")
    })
}

fn compile_item() -> &'static Regex {
    COMPILE_ITEM.get_or_init(|| {
        Regex::new(r#"<Compile\b[^>]*?\b(Include|Remove)\s*=\s*"([^"]*)""#).expect("valid regex")
    })
}

/// Load a project file and its documents
pub fn load_project(path: &Path, config: &ProjectConfig) -> Result<Project> {
    let path = path
        .canonicalize()
        .with_context(|| format!("File does not exist: '{}'.", path.display()))?;
    let directory = path
        .parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("Project file has no directory: {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let (language, supports_compilation) = match extension.as_str() {
        "csproj" => (Language::CSharp, true),
        "shproj" => (Language::CSharp, false),
        "vbproj" => (Language::VisualBasic, true),
        "fsproj" => (Language::FSharp, true),
        _ => anyhow::bail!("Unsupported project file: {}", path.display()),
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read project file: {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let format = project_format(&content);
    let language_version = language_version(&content);
    let symbols = preprocessor_symbols(&content, format);
    debug!(
        "Project {} is {:?}, {} {}, symbols {:?}",
        name, format, language, language_version, symbols
    );

    let mut builder = ProjectBuilder::new(name)
        .language(language)
        .language_version(language_version)
        .format(format)
        .file_path(&path)
        .supports_compilation(supports_compilation)
        .preprocessor_symbols(symbols);

    if language == Language::CSharp {
        let patterns = GeneratedPatterns::new(&config.generated.patterns);
        for file in compile_items(&directory, &content, format) {
            builder = builder.document(load_document(&directory, &file, &patterns)?);
        }
    }

    let project = builder.build();
    debug!(
        "Loaded {} document(s) for {}",
        project.documents().len(),
        project.name()
    );
    Ok(project)
}

/// SDK-style (glob based) or legacy (explicit item list) project file
pub fn project_format(content: &str) -> ProjectFormat {
    if sdk_attribute().is_match(content) || sdk_element().is_match(content) {
        ProjectFormat::SdkStyle
    } else {
        ProjectFormat::Legacy
    }
}

/// First value of an MSBuild property, conditions ignored
pub fn property(content: &str, name: &str) -> Option<String> {
    let pattern = format!(r"(?s)<{0}(?:\s[^>]*)?>\s*([^<]*?)\s*</{0}>", regex::escape(name));
    let regex = Regex::new(&pattern).ok()?;
    regex
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

fn language_version(content: &str) -> LanguageVersion {
    if let Some(version) = property(content, "LangVersion").and_then(|v| LanguageVersion::parse(&v)) {
        return version;
    }

    match target_framework(content) {
        Some(tfm) => LanguageVersion::for_target_framework(&tfm),
        // .NET Framework projects declare TargetFrameworkVersion (v4.x)
        None => LanguageVersion::CSHARP_7_3,
    }
}

/// `TargetFramework`, or the first of `TargetFrameworks`
fn target_framework(content: &str) -> Option<String> {
    property(content, "TargetFramework").or_else(|| {
        property(content, "TargetFrameworks")
            .and_then(|tfms| tfms.split(';').map(str::trim).find(|t| !t.is_empty()).map(String::from))
    })
}

/// Symbols defined for conditional compilation.
///
/// SDK-style projects get the Debug defaults and the target framework
/// symbols (`NET6_0`, `NET5_0_OR_GREATER`, ...) the SDK defines. Both
/// formats add the entries of `DefineConstants`.
pub fn preprocessor_symbols(content: &str, format: ProjectFormat) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    if format == ProjectFormat::SdkStyle {
        symbols.extend(DEFAULT_PREPROCESSOR_SYMBOLS.iter().map(|s| s.to_string()));
        if let Some(tfm) = target_framework(content) {
            symbols.extend(target_framework_symbols(&tfm));
        }
    }

    if let Some(defines) = property(content, "DefineConstants") {
        let defines = defines
            .split([';', ','])
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty() && !symbol.starts_with("$("));
        for symbol in defines {
            if !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.to_string());
            }
        }
    }
    symbols
}

fn target_framework_symbols(tfm: &str) -> Vec<String> {
    let tfm = tfm.trim().to_ascii_lowercase();
    let tfm = tfm.split('-').next().unwrap_or_default();
    let mut symbols = Vec::new();

    if let Some(version) = tfm.strip_prefix("netcoreapp") {
        if let Some(version) = major_minor(version) {
            symbols.push("NETCOREAPP".to_string());
            symbols.push(format!("NETCOREAPP{}_{}", version.0, version.1));
            symbols.extend(or_greater("NETCOREAPP", NETCOREAPP_VERSIONS, version));
        }
    } else if let Some(version) = tfm.strip_prefix("netstandard") {
        if let Some(version) = major_minor(version) {
            symbols.push("NETSTANDARD".to_string());
            symbols.push(format!("NETSTANDARD{}_{}", version.0, version.1));
            symbols.extend(or_greater("NETSTANDARD", NETSTANDARD_VERSIONS, version));
        }
    } else if let Some(version) = tfm.strip_prefix("net") {
        if let Some((major, minor)) = major_minor(version).filter(|(major, _)| *major >= 5) {
            symbols.push("NET".to_string());
            symbols.push("NETCOREAPP".to_string());
            symbols.push(format!("NET{major}_{minor}"));
            symbols.extend((5..=major).map(|m| format!("NET{m}_0_OR_GREATER")));
            symbols.extend(or_greater("NETCOREAPP", NETCOREAPP_VERSIONS, (3, 1)));
        } else if let Some(index) = NETFRAMEWORK_VERSIONS.iter().position(|v| *v == version) {
            symbols.push("NETFRAMEWORK".to_string());
            symbols.push(format!("NET{version}"));
            symbols.extend(
                NETFRAMEWORK_VERSIONS[..=index]
                    .iter()
                    .map(|v| format!("NET{v}_OR_GREATER")),
            );
        }
    }
    symbols
}

fn major_minor(version: &str) -> Option<(u8, u8)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

fn or_greater<'a>(
    prefix: &'a str,
    versions: &'a [(u8, u8)],
    up_to: (u8, u8),
) -> impl Iterator<Item = String> + 'a {
    versions
        .iter()
        .filter(move |version| **version <= up_to)
        .map(move |(major, minor)| format!("{prefix}{major}_{minor}_OR_GREATER"))
}

fn is_false(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("false"))
}

/// Source files compiled by the project, in enumeration order
fn compile_items(directory: &Path, content: &str, format: ProjectFormat) -> Vec<PathBuf> {
    let mut includes = Vec::new();
    let mut removes = Vec::new();
    for captures in compile_item().captures_iter(content) {
        let values = captures[2]
            .split(';')
            .map(|value| value.trim().replace('\\', "/"))
            .filter(|value| !value.is_empty());
        if &captures[1] == "Include" {
            includes.extend(values);
        } else {
            removes.extend(values);
        }
    }

    let mut files = Vec::new();
    let default_items = format == ProjectFormat::SdkStyle
        && !is_false(property(content, "EnableDefaultItems"))
        && !is_false(property(content, "EnableDefaultCompileItems"));
    if default_items {
        files.extend(default_compile_items(directory));
    }

    for include in &includes {
        for file in expand_include(directory, include) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    let removes = compile_globs(&removes, "Compile Remove item");
    if !removes.is_empty() {
        files.retain(|file| {
            let relative = relative_path(directory, file);
            !removes.iter().any(|pattern| pattern.matches_path(&relative))
        });
    }

    files
}

/// `**/*.cs` under the project directory, without `bin/`, `obj/` and hidden folders
fn default_compile_items(directory: &Path) -> Vec<PathBuf> {
    let root = directory.to_path_buf();
    let walker = WalkBuilder::new(directory)
        .standard_filters(false)
        .hidden(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_output_dir = entry.file_type().is_some_and(|t| t.is_dir())
                && entry.path().parent() == Some(root.as_path())
                && matches!(entry.file_name().to_str(), Some("bin" | "obj"));
            !is_output_dir
        })
        .build();

    walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("cs"))
        })
        .collect()
}

fn expand_include(directory: &Path, include: &str) -> Vec<PathBuf> {
    if !include.contains(['*', '?']) {
        let path = directory.join(include);
        if path.is_file() {
            return vec![path];
        }
        warn!("Compile item not found: {}", path.display());
        return Vec::new();
    }

    let pattern = directory.join(include);
    match glob::glob(&pattern.to_string_lossy()) {
        Ok(paths) => {
            let mut paths: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
            paths.sort();
            paths
        }
        Err(e) => {
            warn!("Invalid compile item pattern '{}': {}", include, e);
            Vec::new()
        }
    }
}

fn relative_path(directory: &Path, file: &Path) -> PathBuf {
    file.strip_prefix(directory)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| file.to_path_buf())
}

fn load_document(directory: &Path, file: &Path, patterns: &GeneratedPatterns) -> Result<Document> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read document: {}", file.display()))?;
    let (text, bom) = match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => (stripped.to_string(), true),
        None => (text, false),
    };

    let relative = relative_path(directory, file);
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let folders: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(part) => part.to_str().map(String::from),
                    Component::ParentDir => Some("..".to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Document::new(name, text)
        .in_folders(folders)
        .with_file_path(file)
        .with_utf8_bom(bom)
        .generated(patterns.matches(&relative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <TargetFramework>net6.0</TargetFramework>
    <ImplicitUsings>disable</ImplicitUsings>
  </PropertyGroup>

</Project>
"#;

    const LEGACY_PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="Class1.cs" />
    <Compile Include="Properties\AssemblyInfo.cs" />
  </ItemGroup>
</Project>
"#;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_project_format() {
        assert_eq!(project_format(SDK_PROJECT), ProjectFormat::SdkStyle);
        assert_eq!(project_format(LEGACY_PROJECT), ProjectFormat::Legacy);
        assert_eq!(
            project_format("<Project>\n  <Sdk Name=\"Microsoft.NET.Sdk\" />\n</Project>"),
            ProjectFormat::SdkStyle
        );
    }

    #[test]
    fn test_property() {
        assert_eq!(property(SDK_PROJECT, "TargetFramework").as_deref(), Some("net6.0"));
        assert_eq!(property(SDK_PROJECT, "LangVersion"), None);
        assert_eq!(
            property("<LangVersion Condition=\"x\"> 9.0 </LangVersion>", "LangVersion").as_deref(),
            Some("9.0")
        );
    }

    #[test]
    fn test_language_version_resolution() {
        assert_eq!(language_version(SDK_PROJECT), LanguageVersion::CSHARP_10);
        assert_eq!(language_version(LEGACY_PROJECT), LanguageVersion::CSHARP_7_3);
        assert_eq!(
            language_version("<LangVersion>latest</LangVersion><TargetFramework>net48</TargetFramework>"),
            LanguageVersion::LATEST
        );
        assert_eq!(
            language_version("<TargetFrameworks>net8.0;netstandard2.0</TargetFrameworks>"),
            LanguageVersion::CSHARP_12
        );
    }

    #[test]
    fn test_preprocessor_symbols() {
        let symbols = preprocessor_symbols(
            &SDK_PROJECT.replace(
                "</TargetFramework>",
                "</TargetFramework>\n    <DefineConstants>$(DefineConstants);FEATURE_X</DefineConstants>",
            ),
            ProjectFormat::SdkStyle,
        );
        for expected in [
            "DEBUG",
            "TRACE",
            "NET",
            "NET6_0",
            "NET5_0_OR_GREATER",
            "NET6_0_OR_GREATER",
            "NETCOREAPP3_1_OR_GREATER",
            "FEATURE_X",
        ] {
            assert!(symbols.iter().any(|s| s == expected), "missing {expected}");
        }
        assert!(!symbols.iter().any(|s| s == "NET7_0_OR_GREATER"));

        let legacy = preprocessor_symbols(
            &LEGACY_PROJECT.replace(
                "<TargetFrameworkVersion>",
                "<DefineConstants>DEBUG;TRACE</DefineConstants>\n    <TargetFrameworkVersion>",
            ),
            ProjectFormat::Legacy,
        );
        assert_eq!(legacy, vec!["DEBUG", "TRACE"]);
        assert!(preprocessor_symbols(LEGACY_PROJECT, ProjectFormat::Legacy).is_empty());
    }

    #[test]
    fn test_target_framework_symbols() {
        assert_eq!(
            target_framework_symbols("netstandard2.0"),
            vec![
                "NETSTANDARD",
                "NETSTANDARD2_0",
                "NETSTANDARD1_0_OR_GREATER",
                "NETSTANDARD1_1_OR_GREATER",
                "NETSTANDARD1_2_OR_GREATER",
                "NETSTANDARD1_3_OR_GREATER",
                "NETSTANDARD1_4_OR_GREATER",
                "NETSTANDARD1_5_OR_GREATER",
                "NETSTANDARD1_6_OR_GREATER",
                "NETSTANDARD2_0_OR_GREATER",
            ]
        );
        let framework = target_framework_symbols("net472");
        assert!(framework.contains(&"NETFRAMEWORK".to_string()));
        assert!(framework.contains(&"NET472".to_string()));
        assert!(framework.contains(&"NET46_OR_GREATER".to_string()));
        assert!(!framework.contains(&"NET48_OR_GREATER".to_string()));
    }

    #[test]
    fn test_conditional_usings_follow_project_symbols() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "App.csproj", SDK_PROJECT);
        write(
            dir.path(),
            "Program.cs",
            "#if NET6_0_OR_GREATER\nusing System.Linq;\n#else\nusing System.Collections;\n#endif\n",
        );

        let project = load_project(&dir.path().join("App.csproj"), &ProjectConfig::default()).unwrap();
        let tree = project.documents()[0].syntax_tree().unwrap();
        let names: Vec<String> = tree.usings().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["System.Linq"]);
    }

    #[test]
    fn test_invalid_compile_remove_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "App.csproj",
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <ItemGroup>\n    <Compile Remove=\"[\" />\n  </ItemGroup>\n</Project>\n",
        );
        write(dir.path(), "Program.cs", "using System;\n");

        let project = load_project(&dir.path().join("App.csproj"), &ProjectConfig::default()).unwrap();
        assert_eq!(project.documents().len(), 1);
    }

    #[test]
    fn test_load_sdk_project_globs_sources() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "App.csproj", SDK_PROJECT);
        write(dir.path(), "MyClass1.cs", "using System;\n");
        write(dir.path(), "MyClass2.cs", "\u{feff}using System;\n");
        write(dir.path(), "Properties/AssemblyInfo.cs", "using System.Reflection;\n");
        write(dir.path(), "obj/Debug/App.AssemblyInfo.cs", "using System;\n");
        write(dir.path(), "bin/Stale.cs", "using System;\n");
        write(dir.path(), ".hidden/Secret.cs", "using System;\n");
        write(dir.path(), "README.md", "# App\n");

        let project = load_project(&dir.path().join("App.csproj"), &ProjectConfig::default()).unwrap();

        assert_eq!(project.name(), "App");
        assert_eq!(project.format(), ProjectFormat::SdkStyle);
        assert_eq!(project.language_version(), LanguageVersion::CSHARP_10);
        let paths: Vec<PathBuf> = project.documents().iter().map(Document::relative_path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("MyClass1.cs"),
                PathBuf::from("MyClass2.cs"),
                PathBuf::from("Properties").join("AssemblyInfo.cs"),
            ]
        );
        assert_eq!(project.documents()[1].text(), "using System;\n");
        assert!(project.documents()[1].has_utf8_bom());
        assert!(!project.documents()[0].has_utf8_bom());
    }

    #[test]
    fn test_load_legacy_project_uses_item_list() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Legacy.csproj", LEGACY_PROJECT);
        write(dir.path(), "Class1.cs", "using System;\n");
        write(dir.path(), "Properties/AssemblyInfo.cs", "using System.Reflection;\n");
        write(dir.path(), "NotCompiled.cs", "using System.Linq;\n");

        let project =
            load_project(&dir.path().join("Legacy.csproj"), &ProjectConfig::default()).unwrap();

        assert_eq!(project.format(), ProjectFormat::Legacy);
        let names: Vec<&str> = project.documents().iter().map(Document::name).collect();
        assert_eq!(names, vec!["Class1.cs", "AssemblyInfo.cs"]);
        assert_eq!(project.documents()[1].folders(), ["Properties".to_string()]);
    }

    #[test]
    fn test_compile_remove_and_generated_patterns() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "App.csproj",
            r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <Compile Remove="Scratch/**" />
  </ItemGroup>
</Project>
"#,
        );
        write(dir.path(), "Program.cs", "using System;\n");
        write(dir.path(), "Scratch/Draft.cs", "using System;\n");
        write(dir.path(), "Migrations/Init.cs", "using System;\n");

        let mut config = ProjectConfig::default();
        config.generated.patterns = vec!["Migrations/*.cs".to_string()];
        let project = load_project(&dir.path().join("App.csproj"), &config).unwrap();

        let names: Vec<&str> = project.documents().iter().map(Document::name).collect();
        assert_eq!(names, vec!["Init.cs", "Program.cs"]);
        assert!(project.documents()[0].is_generated());
        assert!(!project.documents()[1].is_generated());
    }

    #[test]
    fn test_visual_basic_and_shared_projects() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Lib.vbproj", SDK_PROJECT);
        write(dir.path(), "Shared.shproj", "<Project ToolsVersion=\"14.0\">\n</Project>\n");

        let vb = load_project(&dir.path().join("Lib.vbproj"), &ProjectConfig::default()).unwrap();
        assert_eq!(vb.language(), Language::VisualBasic);
        assert!(vb.documents().is_empty());

        let shared =
            load_project(&dir.path().join("Shared.shproj"), &ProjectConfig::default()).unwrap();
        assert!(shared.compilation().is_none());
    }

    #[test]
    fn test_missing_project_file() {
        let err = load_project(Path::new("ProjectFileDoesNotExist.csproj"), &ProjectConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "File does not exist: 'ProjectFileDoesNotExist.csproj'."
        );
    }
}
