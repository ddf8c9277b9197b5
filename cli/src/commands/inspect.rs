use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use sdkify::rules;
use sdkify::{parse_project, ProjectConverter, SimpleEvaluator, StaticVersionTable};

use crate::output::Format;
use crate::solution;

#[derive(Args)]
pub struct InspectArgs {
    /// Project file, solution file, or directory to inspect
    pub path: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

pub fn run(args: InspectArgs) -> Result<ExitCode> {
    let projects = solution::enumerate_projects(&args.path)?;
    let evaluator = SimpleEvaluator::new();
    let versions = StaticVersionTable;
    let converter = ProjectConverter::new(&evaluator, &versions);

    for project in &projects {
        let xml = fs::read(project)
            .with_context(|| format!("failed to read project {}", project.display()))?;
        let project_name = project
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("project");
        let doc = parse_project(&xml, project_name)
            .with_context(|| format!("failed to parse {}", project.display()))?;
        let report = converter
            .inspect(&doc)
            .with_context(|| format!("failed to inspect {}", project.display()))?;

        let sdk = rules::sdk_for_style(report.style, report.uses_wpf, report.uses_winforms);
        match args.format {
            Format::Text => {
                println!("{}:", project.display());
                println!("  style: {}", report.style);
                if report.style.is_supported() {
                    println!("  sdk: {sdk}");
                } else {
                    println!("  not convertible");
                }
            }
            Format::Json => {
                let value = serde_json::json!({
                    "project": project.display().to_string(),
                    "style": report.style,
                    "uses_wpf": report.uses_wpf,
                    "uses_winforms": report.uses_winforms,
                    "supported": report.style.is_supported(),
                    "sdk": report.style.is_supported().then_some(sdk),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
