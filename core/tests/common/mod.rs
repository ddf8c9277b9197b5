//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use sdkify::document::ProjectDocument;
use sdkify::evaluate::{EvalError, EvaluatedItem, EvaluatedProject, ProjectEvaluator};
use sdkify::Configuration;
use sdkify::SimpleEvaluator;

pub const MSBUILD_XMLNS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

pub fn doc_from_xml(xml: &str, project_name: &str) -> ProjectDocument {
    sdkify::parse_project(xml.as_bytes(), project_name).expect("fixture should parse")
}

/// A stock legacy class library with both common imports.
pub fn legacy_library_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" DefaultTargets="Build" xmlns="{MSBUILD_XMLNS}">
  <Import Project="$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props" Condition="Exists('$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props')" />
  <PropertyGroup>
    <Configuration Condition=" '$(Configuration)' == '' ">Debug</Configuration>
    <Platform Condition=" '$(Platform)' == '' ">AnyCPU</Platform>
    <ProjectGuid>{{11111111-2222-3333-4444-555555555555}}</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>LegacyLib</RootNamespace>
    <AssemblyName>LegacyLib</AssemblyName>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
    <FileAlignment>512</FileAlignment>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
    <Reference Include="System.Xml" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="Class1.cs" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>
"#
    )
}

/// A WPF executable referencing the full presentation stack.
pub fn legacy_wpf_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" DefaultTargets="Build" xmlns="{MSBUILD_XMLNS}">
  <Import Project="$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props" />
  <PropertyGroup>
    <OutputType>WinExe</OutputType>
    <TargetFrameworkVersion>v4.8</TargetFrameworkVersion>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="PresentationCore" />
    <Reference Include="PresentationFramework" />
    <Reference Include="WindowsBase" />
    <Reference Include="System" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="App.xaml.cs" />
    <Compile Include="Properties\AssemblyInfo.cs" />
  </ItemGroup>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
</Project>
"#
    )
}

/// Wraps [`SimpleEvaluator`] and grafts extra items onto the baseline
/// side (documents with an Sdk attribute), standing in for an evaluator
/// that performs filesystem globbing.
pub struct GlobbingEvaluator {
    inner: SimpleEvaluator,
    pub baseline_items: Vec<EvaluatedItem>,
}

impl GlobbingEvaluator {
    pub fn new(baseline_items: Vec<EvaluatedItem>) -> Self {
        GlobbingEvaluator {
            inner: SimpleEvaluator::new(),
            baseline_items,
        }
    }
}

impl ProjectEvaluator for GlobbingEvaluator {
    fn evaluate(
        &self,
        doc: &ProjectDocument,
        config: &Configuration,
        globals: &[(String, String)],
    ) -> Result<EvaluatedProject, EvalError> {
        let mut project = self.inner.evaluate(doc, config, globals)?;
        if doc.sdk.is_some() {
            project.items.extend(self.baseline_items.iter().cloned());
        }
        Ok(project)
    }
}
