use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::extract::{Eligibility, HeritageMatch};

pub const ROOT_ENV: &str = "NAMESPACE_REGISTRY_ROOT";

/// Where the declaration root came from; the label goes into generated headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRoot {
    pub path: PathBuf,
    pub label: String,
}

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    types: Option<String>,
    typings: Option<String>,
}

pub fn resolve_scan_root(cli: &Cli) -> Result<ScanRoot> {
    if let Some(p) = cli.root.clone() {
        return Ok(ScanRoot {
            label: root_label(&p),
            path: p,
        });
    }

    if let Ok(p) = env::var(ROOT_ENV) {
        let path = PathBuf::from(p);
        return Ok(ScanRoot {
            label: root_label(&path),
            path,
        });
    }

    let cwd = env::current_dir().context("Failed to resolve current directory")?;
    let package_dir = locate_package(&cwd, &cli.package)?;
    Ok(ScanRoot {
        path: declaration_dir(&package_dir)?,
        label: cli.package.clone(),
    })
}

pub fn eligibility(cli: &Cli) -> Eligibility {
    let mode = if cli.structural {
        HeritageMatch::Structural
    } else {
        HeritageMatch::Substring
    };
    Eligibility::new(&cli.marker, mode)
}

/// Walks up from `start` looking for `node_modules/<package>`.
pub fn locate_package(start: &Path, package: &str) -> Result<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join("node_modules").join(package);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }
    bail!(
        "Package {package} not found in any node_modules above {} (use --root or {ROOT_ENV})",
        start.display()
    )
}

/// The directory holding the package's declarations: the parent of its
/// `types`/`typings` entry when the manifest names one, else the package itself.
pub fn declaration_dir(package_dir: &Path) -> Result<PathBuf> {
    let manifest_path = package_dir.join("package.json");
    if !manifest_path.exists() {
        return Ok(package_dir.to_path_buf());
    }

    let raw = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest: PackageManifest = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

    let entry = manifest.types.or(manifest.typings);
    let dir = entry
        .map(|e| package_dir.join(e))
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .filter(|p| p.is_dir())
        .unwrap_or_else(|| package_dir.to_path_buf());
    Ok(dir)
}

fn root_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}
