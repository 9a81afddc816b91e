//! `csusing using` command tests
//!
//! Runs the built binary against temporary project directories.

use std::path::Path;
use std::process::Command;

fn csusing_bin() -> String {
    env!("CARGO_BIN_EXE_csusing").to_string()
}

const SDK_PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFramework>net6.0</TargetFramework>
    <ImplicitUsings>disable</ImplicitUsings>
  </PropertyGroup>

</Project>
"#;

const CLASS_1: &str = r#"using System;
using System.Collections.Generic;
using System.Linq;

namespace ProjectUnderTest;

internal class MyClass1
{
}
"#;

const CLASS_2: &str = r#"using System;
using System.Text;

namespace ProjectUnderTest
{
    internal class MyClass2
    {
    }
}
"#;

fn setup_project(project_file: &str, content: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(project_file), content).unwrap();
    std::fs::write(dir.path().join("MyClass1.cs"), CLASS_1).unwrap();
    std::fs::write(dir.path().join("MyClass2.cs"), CLASS_2).unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(csusing_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run csusing");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_count_all_usings() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, stdout, stderr) = run(dir.path(), &["using", "count"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(
        stdout,
        "Project: ProjectUnderTest\n  System: 2\n  System.Collections.Generic: 1\n  System.Linq: 1\n  System.Text: 1\n"
    );
}

#[test]
fn test_count_specified_usings() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, stdout, _) = run(dir.path(), &["using", "count", "System.Text", "System.Xml"]);

    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "Project: ProjectUnderTest\n  System.Text: 1\n  System.Xml: 0\n"
    );
}

#[test]
fn test_count_json_output() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, stdout, _) = run(dir.path(), &["--format", "json", "using", "count", "System"]);

    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["project_name"], "ProjectUnderTest");
    assert_eq!(json["usings"][0]["name"], "System");
    assert_eq!(json["usings"][0]["occurrences"], 2);
}

#[test]
fn test_count_with_explicit_project() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let other = tempfile::tempdir().unwrap();
    let project = dir.path().join("ProjectUnderTest.csproj");

    let (code, stdout, _) = run(
        other.path(),
        &["using", "count", "System", "--proj", project.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, "Project: ProjectUnderTest\n  System: 2\n");
}

#[test]
fn test_missing_project_file() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run(dir.path(), &["using", "count"]);

    assert_ne!(code, 0);
    assert!(
        stderr.contains(
            "Specify a project file. The current working directory does not contain a project file."
        ),
        "stderr: {stderr}"
    );

    let (code, _, stderr) = run(
        dir.path(),
        &["using", "count", "--project", "ProjectFileDoesNotExist.csproj"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("File does not exist: 'ProjectFileDoesNotExist.csproj'."));
}

#[test]
fn test_more_than_one_project_file() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    std::fs::write(dir.path().join("Other.csproj"), SDK_PROJECT).unwrap();

    let (code, _, stderr) = run(dir.path(), &["using", "count"]);
    assert_ne!(code, 0);
    assert!(stderr.contains(
        "Specify which project file to use because this folder contains more than one project file."
    ));
}

#[test]
fn test_visual_basic_not_supported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ProjectUnderTest.vbproj"), SDK_PROJECT).unwrap();

    let (code, _, stderr) = run(dir.path(), &["using", "count"]);
    assert_ne!(code, 0);
    assert!(
        stderr.contains(
            "Cannot open project 'ProjectUnderTest' because the language 'Visual Basic' is not supported."
        ),
        "stderr: {stderr}"
    );
}

#[test]
fn test_globalize_requires_force_without_usings() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, _, stderr) = run(dir.path(), &["using", "globalize"]);

    assert_ne!(code, 0);
    assert!(stderr.contains(
        "No usings specified. To globalize all top-level using directives, run the command with '--force' option."
    ));
    assert!(!dir.path().join("GlobalUsings.cs").exists());
}

#[test]
fn test_globalize_single_using() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, stdout, stderr) = run(dir.path(), &["using", "globalize", "System"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(
        stdout,
        "Project: ProjectUnderTest\n2 occurrences of Using Directive \"System\" were globalized to \"GlobalUsings.cs\".\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("GlobalUsings.cs")).unwrap(),
        "global using System;\n"
    );
    let class_1 = std::fs::read_to_string(dir.path().join("MyClass1.cs")).unwrap();
    assert!(!class_1.contains("using System;\n"));
    assert!(class_1.starts_with("using System.Collections.Generic;\n"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("ProjectUnderTest.csproj")).unwrap(),
        SDK_PROJECT
    );
}

#[test]
fn test_globalize_force_then_extend() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, _, _) = run(dir.path(), &["using", "globalize", "System"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run(dir.path(), &["using", "globalize", "--force"]);
    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "Project: ProjectUnderTest\n3 occurrences of 3 Using Directives were globalized to \"GlobalUsings.cs\".\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("GlobalUsings.cs")).unwrap(),
        "global using System;\nglobal using System.Collections.Generic;\nglobal using System.Linq;\nglobal using System.Text;\n"
    );

    let (_, stdout, _) = run(dir.path(), &["using", "count"]);
    assert_eq!(stdout, "Project: ProjectUnderTest\n");
}

#[test]
fn test_globalize_dry_run_writes_nothing() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, stdout, _) = run(dir.path(), &["using", "globalize", "System", "--dry-run"]);

    assert_eq!(code, 0);
    assert!(stdout.contains("2 occurrences of Using Directive \"System\""));
    assert!(!dir.path().join("GlobalUsings.cs").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("MyClass1.cs")).unwrap(),
        CLASS_1
    );
}

#[test]
fn test_globalize_no_occurrences() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let (code, stdout, _) = run(dir.path(), &["using", "globalize", "System.Xml"]);

    assert_eq!(code, 0);
    assert_eq!(
        stdout,
        "Project: ProjectUnderTest\nNo occurrences of Using Directive \"System.Xml\" were globalized.\n"
    );
    assert!(!dir.path().join("GlobalUsings.cs").exists());
}

#[test]
fn test_globalize_rejects_old_language_version() {
    let dir = setup_project(
        "ProjectUnderTest.csproj",
        &SDK_PROJECT.replace("net6.0", "net5.0"),
    );
    let (code, _, stderr) = run(dir.path(), &["using", "globalize", "System"]);

    assert_ne!(code, 0);
    assert!(stderr.contains("global using directive"), "stderr: {stderr}");
    assert!(!dir.path().join("GlobalUsings.cs").exists());
}

const LEGACY_PROJECT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
    <LangVersion>10</LangVersion>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="MyClass1.cs" />
    <Compile Include="MyClass2.cs" />
  </ItemGroup>
</Project>
"#;

#[test]
fn test_globalize_leaves_legacy_project_file_untouched() {
    let dir = setup_project("ProjectUnderTest.csproj", LEGACY_PROJECT);
    let (code, stdout, stderr) = run(dir.path(), &["using", "globalize", "System"]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.contains("2 occurrences of Using Directive \"System\""));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("GlobalUsings.cs")).unwrap(),
        "global using System;\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("ProjectUnderTest.csproj")).unwrap(),
        LEGACY_PROJECT
    );
}

#[test]
fn test_globalize_syntax_error_writes_nothing() {
    let dir = setup_project("ProjectUnderTest.csproj", SDK_PROJECT);
    let broken = "using System.Linq\nclass C {\n";
    std::fs::write(dir.path().join("Broken.cs"), broken).unwrap();

    let (code, _, stderr) = run(dir.path(), &["using", "globalize", "--force"]);

    assert_ne!(code, 0, "stderr: {stderr}");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("MyClass1.cs")).unwrap(),
        CLASS_1
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Broken.cs")).unwrap(),
        broken
    );
    assert!(!dir.path().join("GlobalUsings.cs").exists());
}

#[test]
fn test_count_conditional_usings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ProjectUnderTest.csproj"), SDK_PROJECT).unwrap();
    std::fs::write(
        dir.path().join("MyClass1.cs"),
        "using System;\n#if DEBUG\nusing System.Diagnostics;\n#endif\nclass C { }\n",
    )
    .unwrap();

    let (code, stdout, stderr) = run(dir.path(), &["using", "count"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(
        stdout,
        "Project: ProjectUnderTest\n  System: 1\n  System.Diagnostics: 1\n"
    );
}
