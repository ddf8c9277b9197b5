//! JSON rendering of conversion results.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use sdkify::{ConversionOutcome, ConversionReport, StyleReport};

#[derive(Serialize)]
struct Summary<'a> {
    project: String,
    #[serde(flatten)]
    style: &'a StyleReport,
    sdk: Option<&'a str>,
    target_framework: &'a str,
    report: &'a ConversionReport,
}

pub fn render_summary(project: &Path, outcome: &ConversionOutcome) -> Result<String> {
    let summary = Summary {
        project: project.display().to_string(),
        style: &outcome.style,
        sdk: outcome.document.sdk.as_deref(),
        target_framework: &outcome.target_framework,
        report: &outcome.report,
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_carries_schema_versioned_report() {
        use sdkify::{ProjectConverter, SimpleEvaluator, StaticVersionTable};

        let xml = r#"<Project>
  <Import Project="$(MSBuildToolsPath)\Microsoft.CSharp.targets" />
  <PropertyGroup>
    <OutputType>Library</OutputType>
    <TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion>
  </PropertyGroup>
</Project>"#;
        let doc = sdkify::parse_project(xml.as_bytes(), "App").unwrap();
        let evaluator = SimpleEvaluator::new();
        let versions = StaticVersionTable;
        let outcome = ProjectConverter::new(&evaluator, &versions)
            .convert(&doc, None)
            .unwrap();

        let json = render_summary(Path::new("App.csproj"), &outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["project"], "App.csproj");
        assert_eq!(value["report"]["version"], sdkify::SCHEMA_VERSION);
        assert_eq!(value["target_framework"], "net472");
    }
}
