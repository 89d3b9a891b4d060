use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::extract::DEFAULT_MARKER;

pub const DEFAULT_PACKAGE: &str = "ableton-js";

#[derive(Debug, Clone, Parser)]
#[command(name = "namespace-registry")]
#[command(about = "Generate a typed registry of Namespace classes from TypeScript declaration files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory to scan; overrides NAMESPACE_REGISTRY_ROOT and --package.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Installed package whose declarations are scanned when no root is given.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_PACKAGE)]
    pub package: String,

    #[arg(long, value_name = "NAME", default_value = DEFAULT_MARKER)]
    pub marker: String,

    /// Match the `extends` base structurally instead of by heritage substring.
    #[arg(long)]
    pub structural: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Generate {
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Ts)]
        format: OutputFormat,

        /// Fail instead of writing when the output file is out of date.
        #[arg(long, requires = "output")]
        check: bool,
    },
    List {
        #[arg(short = 'f', long, value_enum, default_value_t = ListFormat::Json)]
        format: ListFormat,
    },
    Show {
        class_name: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Ts,
    Json,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Json,
    Text,
}
