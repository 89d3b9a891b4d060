use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::model::{DeclarationFile, DeclarationSet};
use crate::structure::parse_declaration_file;

pub const DECLARATION_SUFFIX: &str = ".d.ts";

pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(DECLARATION_SUFFIX))
}

/// Recursively collects every `*.d.ts` file under `base_path`, sorted by path.
pub fn scan_declaration_files(base_path: &Path) -> Result<Vec<PathBuf>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if entry.file_type().is_some_and(|t| t.is_file()) && is_declaration_file(path) {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx.iter().collect();
    files.sort();
    Ok(files)
}

/// Loads and lowers every declaration file under `root`.
///
/// A missing or non-directory root is fatal. Individual files that cannot be
/// read are skipped with a warning.
pub fn load_declaration_set(root: &Path) -> Result<DeclarationSet> {
    if !root.exists() {
        bail!("Declaration root not found: {}", root.display());
    }
    if !root.is_dir() {
        bail!("Declaration root is not a directory: {}", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve declaration root: {}", root.display()))?;

    let paths = scan_declaration_files(&root)?;
    log::debug!("found {} declaration files under {}", paths.len(), root.display());
    if paths.is_empty() {
        log::warn!("no {DECLARATION_SUFFIX} files under {}", root.display());
    }

    let files: Vec<DeclarationFile> = paths
        .par_iter()
        .filter_map(|path| match load_file(path) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("skipping {}: {e:#}", path.display());
                None
            }
        })
        .collect();

    Ok(DeclarationSet::new(root, files))
}

fn load_file(path: &Path) -> Result<DeclarationFile> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_declaration_file(path, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn scan_finds_nested_declaration_files_in_order() {
        let base = temp_dir("namespace-registry-scan");
        fs::create_dir_all(base.join("ns/b")).unwrap();
        fs::create_dir_all(base.join(".hidden")).unwrap();
        fs::write(base.join("ns/b/track.d.ts"), "").unwrap();
        fs::write(base.join("ns/a.d.ts"), "").unwrap();
        fs::write(base.join(".hidden/x.d.ts"), "").unwrap();
        fs::write(base.join("ns/index.ts"), "").unwrap();
        fs::write(base.join("ns/index.js"), "").unwrap();

        let files = scan_declaration_files(&base).unwrap();
        let rel: Vec<PathBuf> = files
            .iter()
            .map(|p| p.strip_prefix(&base).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from(".hidden/x.d.ts"),
                PathBuf::from("ns/a.d.ts"),
                PathBuf::from("ns/b/track.d.ts"),
            ]
        );

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn load_rejects_missing_root() {
        let missing = temp_dir("namespace-registry-missing");
        let err = load_declaration_set(&missing).unwrap_err();
        assert!(err.to_string().contains("Declaration root not found"));
    }

    #[test]
    fn load_builds_symbols_across_files() {
        let base = temp_dir("namespace-registry-load");
        fs::create_dir_all(&base).unwrap();
        fs::write(
            base.join("enums.d.ts"),
            "export declare enum Quantization { q_no_q = 0, q_8_bars = 1 }",
        )
        .unwrap();
        fs::write(
            base.join("song.d.ts"),
            "export declare class Song extends Namespace<Raw> {}",
        )
        .unwrap();

        let set = load_declaration_set(&base).unwrap();
        assert_eq!(set.files.len(), 2);
        assert!(set.files[0].path.ends_with("enums.d.ts"));
        assert_eq!(set.files[1].classes[0].name, "Song");
        assert!(set.symbols.enum_decl("Quantization").is_some());

        let _ = fs::remove_dir_all(base);
    }
}
