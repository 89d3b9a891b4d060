use anyhow::{Context, Result, bail};
use clap::Parser;
use namespace_registry::cli::{Cli, Commands, ListFormat, OutputFormat};
use namespace_registry::config::{ScanRoot, eligibility, resolve_scan_root, write_output};
use namespace_registry::emit::{hash_content, render_json, render_typescript};
use namespace_registry::registry::{Registry, build_registry};
use namespace_registry::scan::load_declaration_set;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();
    let cli = parse_cli()?;

    match cli.command.clone() {
        Commands::Generate {
            output,
            format,
            check,
        } => {
            let root = resolve_scan_root(&cli)?;
            let result = generate(&cli, &root, format, output.as_deref(), check)?;
            if let Some(summary) = result {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Commands::List { format } => {
            let root = resolve_scan_root(&cli)?;
            let (registry, _) = scan(&cli, &root)?;
            write_list(&registry, format)?;
        }
        Commands::Show { class_name } => {
            let root = resolve_scan_root(&cli)?;
            let (registry, _) = scan(&cli, &root)?;
            let record = registry.get(&class_name).with_context(|| {
                format!("Class {class_name} not found (scanned: {})", root.path.display())
            })?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }

    Ok(())
}

fn parse_cli() -> Result<Cli> {
    let args: Vec<String> = std::env::args().collect();
    Ok(Cli::parse_from(rewrite_args_for_implicit_generate(args)))
}

/// Inserts `generate` when no subcommand is given, so a bare invocation
/// (optionally with global options) regenerates the registry.
fn rewrite_args_for_implicit_generate(mut args: Vec<String>) -> Vec<String> {
    let subcommands = ["generate", "list", "show", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--root" || a == "--package" || a == "--marker" {
            idx += 2;
            continue;
        }

        if a == "-h" || a == "--help" || a == "-V" || a == "--version" {
            return args;
        }

        if a.starts_with('-') && !is_generate_option(a) {
            idx += 1;
            continue;
        }

        break;
    }

    let has_subcommand = args
        .get(idx)
        .is_some_and(|token| subcommands.contains(&token.as_str()));
    if !has_subcommand {
        let idx = idx.min(args.len());
        args.insert(idx, "generate".to_string());
    }

    args
}

fn is_generate_option(arg: &str) -> bool {
    let name = arg.split('=').next().unwrap_or(arg);
    matches!(name, "-o" | "--output" | "-f" | "--format" | "--check")
}

#[derive(Debug, Serialize)]
struct GenerateSummary {
    root: String,
    files_scanned: usize,
    classes: usize,
    output: String,
    sha256: String,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    gettable: usize,
    settable: usize,
    methods: usize,
}

fn scan(cli: &Cli, root: &ScanRoot) -> Result<(Registry, usize)> {
    let set = load_declaration_set(&root.path)?;
    let registry = build_registry(&set, &eligibility(cli));
    log::info!(
        "{} namespace classes from {} files ({} enums, {} aliases)",
        registry.len(),
        set.files.len(),
        set.symbols.enum_count(),
        set.symbols.alias_count()
    );
    Ok((registry, set.files.len()))
}

fn generate(
    cli: &Cli,
    root: &ScanRoot,
    format: OutputFormat,
    output: Option<&Path>,
    check: bool,
) -> Result<Option<GenerateSummary>> {
    let start = Instant::now();
    let (registry, files_scanned) = scan(cli, root)?;
    let content = match format {
        OutputFormat::Ts => render_typescript(&registry, &root.label)?,
        OutputFormat::Json => render_json(&registry)?,
    };
    let sha256 = hash_content(&content);

    let Some(path) = output else {
        print!("{content}");
        return Ok(None);
    };

    if check {
        let existing = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read output file: {}", path.display()))?;
        let existing_sha = hash_content(&existing);
        if existing_sha != sha256 {
            bail!(
                "{} is out of date (found {existing_sha}, expected {sha256}); rerun generate",
                path.display()
            );
        }
    } else {
        write_output(path, &content)?;
    }

    Ok(Some(GenerateSummary {
        root: root.path.to_string_lossy().to_string(),
        files_scanned,
        classes: registry.len(),
        output: path.to_string_lossy().to_string(),
        sha256,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}

fn write_list(registry: &Registry, format: ListFormat) -> Result<()> {
    let entries: Vec<ListEntry> = registry
        .records()
        .iter()
        .map(|r| ListEntry {
            name: &r.name,
            gettable: r.gettable.len(),
            settable: r.settable.len(),
            methods: r.methods.len(),
        })
        .collect();

    match format {
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        ListFormat::Text => {
            for e in &entries {
                println!(
                    "{}: {} gettable, {} settable, {} methods",
                    e.name, e.gettable, e.settable, e.methods
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rewrite_inserts_generate_after_global_options() {
        let rewritten = rewrite_args_for_implicit_generate(args(&[
            "namespace-registry",
            "--root",
            "/tmp/decls",
            "--structural",
            "-o",
            "out.ts",
        ]));
        assert_eq!(
            rewritten,
            args(&[
                "namespace-registry",
                "--root",
                "/tmp/decls",
                "--structural",
                "generate",
                "-o",
                "out.ts",
            ])
        );
    }

    #[test]
    fn rewrite_handles_bare_invocation_and_explicit_subcommands() {
        assert_eq!(
            rewrite_args_for_implicit_generate(args(&["namespace-registry"])),
            args(&["namespace-registry", "generate"])
        );

        let explicit = args(&["namespace-registry", "--package", "x", "show", "Song"]);
        assert_eq!(rewrite_args_for_implicit_generate(explicit.clone()), explicit);

        let help = args(&["namespace-registry", "--help"]);
        assert_eq!(rewrite_args_for_implicit_generate(help.clone()), help);
    }
}
