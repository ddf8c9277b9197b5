use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;

use sdkify::{
    parse_packages_config, parse_project, write_project, CachedVersionSource, ConversionOutcome,
    ConvertOptions, PackagesManifest, ProjectConverter, SimpleEvaluator, StaticVersionTable,
};

use crate::output::{self, Format};
use crate::solution;

#[derive(Args)]
pub struct ConvertArgs {
    /// Project file, solution file, or directory to convert
    pub path: PathBuf,

    /// Write the converted project here instead of converting in place
    /// (single project only)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip the .orig backup; obsolete files such as packages.config are
    /// deleted instead of left behind
    #[arg(long)]
    pub no_backup: bool,

    /// Target framework moniker to use instead of the mapped one
    #[arg(long)]
    pub target_framework: Option<String>,

    /// Summary format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Write a plain-text report of every rewrite to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub fn run(args: ConvertArgs) -> Result<ExitCode> {
    let projects = solution::enumerate_projects(&args.path)?;
    if projects.len() > 1 && args.output.is_some() {
        bail!("--output cannot be used when converting more than one project");
    }

    let evaluator = SimpleEvaluator::new();
    let versions = CachedVersionSource::new(StaticVersionTable);
    let converter = ProjectConverter::new(&evaluator, &versions).with_options(ConvertOptions {
        target_framework: args.target_framework.clone(),
    });

    for project in &projects {
        let outcome = convert_one(&converter, project, &args)?;
        let summary = match args.format {
            Format::Text => output::text::render_summary(project, &outcome),
            Format::Json => output::json::render_summary(project, &outcome)?,
        };
        print!("{summary}");
        if let Some(report_path) = &args.report {
            fs::write(report_path, output::text::render_report(&outcome.report))
                .with_context(|| format!("failed to write report to {}", report_path.display()))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn convert_one(
    converter: &ProjectConverter<'_>,
    project: &Path,
    args: &ConvertArgs,
) -> Result<ConversionOutcome> {
    let xml = fs::read(project)
        .with_context(|| format!("failed to read project {}", project.display()))?;
    let project_name = project
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("project");
    let doc = parse_project(&xml, project_name)
        .with_context(|| format!("failed to parse {}", project.display()))?;

    let manifest = load_manifest(project)?;
    let outcome = converter
        .convert(&doc, manifest.as_ref())
        .with_context(|| format!("failed to convert {}", project.display()))?;

    let destination = args.output.clone().unwrap_or_else(|| project.to_path_buf());
    let in_place = destination == project;

    if in_place && !args.no_backup && !outcome.report.is_noop() {
        let backup = backup_path(project);
        fs::copy(project, &backup)
            .with_context(|| format!("failed to back up to {}", backup.display()))?;
    }

    let converted = write_project(&outcome.document)?;
    fs::write(&destination, converted)
        .with_context(|| format!("failed to write {}", destination.display()))?;

    if args.no_backup {
        for obsolete in outcome.report.obsolete_files() {
            let path = Path::new(obsolete);
            if path.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("failed to delete {}", path.display()))?;
            }
        }
    }

    Ok(outcome)
}

fn backup_path(project: &Path) -> PathBuf {
    let mut name = project.as_os_str().to_os_string();
    name.push(".orig");
    PathBuf::from(name)
}

fn load_manifest(project: &Path) -> Result<Option<PackagesManifest>> {
    let path = project
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("packages.config");
    if !path.is_file() {
        return Ok(None);
    }
    let xml = fs::read(&path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let entries = parse_packages_config(&xml)
        .with_context(|| format!("failed to parse manifest {}", path.display()))?;
    Ok(Some(PackagesManifest {
        path: path.display().to_string(),
        entries,
    }))
}
