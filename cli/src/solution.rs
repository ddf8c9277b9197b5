//! Project discovery for solution files and directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

pub fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PROJECT_EXTENSIONS.iter().any(|p| p.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Expands a user-supplied path to the list of project files to convert.
pub fn enumerate_projects(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let mut projects = Vec::new();
        collect_from_directory(path, &mut projects)?;
        if projects.is_empty() {
            bail!("no project files found under {}", path.display());
        }
        projects.sort();
        return Ok(projects);
    }

    if !path.is_file() {
        bail!("{} does not exist", path.display());
    }

    if path.extension().and_then(|e| e.to_str()) == Some("sln") {
        let projects = parse_solution(path)?;
        if projects.is_empty() {
            bail!("no project entries found in {}", path.display());
        }
        return Ok(projects);
    }

    if !is_project_file(path) {
        bail!("{} is not a project or solution file", path.display());
    }
    Ok(vec![path.to_path_buf()])
}

fn collect_from_directory(dir: &Path, projects: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_from_directory(&path, projects)?;
        } else if is_project_file(&path) {
            projects.push(path);
        }
    }
    Ok(())
}

/// Minimal line scan over the solution's `Project(...)` entries. The
/// format's project lines carry the relative path as the second quoted
/// string; no full parser is needed for that.
fn parse_solution(sln: &Path) -> Result<Vec<PathBuf>> {
    let text = fs::read_to_string(sln)
        .with_context(|| format!("failed to read solution {}", sln.display()))?;
    let base = sln.parent().unwrap_or_else(|| Path::new("."));

    let mut projects = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("Project(") {
            continue;
        }
        for quoted in trimmed.split('"').skip(1).step_by(2) {
            let candidate = Path::new(quoted);
            if is_project_file(candidate) {
                let relative: PathBuf = quoted.split('\\').collect();
                projects.push(base.join(relative));
                break;
            }
        }
    }
    Ok(projects)
}
