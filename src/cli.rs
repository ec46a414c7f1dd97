//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lintel",
    version,
    about = "License/copyright metadata compliance for source trees",
    long_about = "Lintel — check that every file declares its copyright holders and an SPDX \
license expression, that every used license has a text in LICENSES/, and that every text \
there is used.\n\nConfiguration precedence: CLI > lintel.toml > defaults.",
    after_help = "Examples:\n  lintel lint\n  lintel lint --output json\n  lintel annotate --copyright \"2024 Jane Doe\" --license MIT src/main.rs\n  lintel bom > project.spdx",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands for linting, annotating, and exporting.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current lintel version.")]
    Version,
    /// Check the tree for compliance
    #[command(
        about = "Run the compliance check",
        long_about = "Scan the project tree, cross-reference used licenses against LICENSES/, \
and print a categorized report. Exits 1 when the project is not compliant.",
        after_help = "Examples:\n  lintel lint\n  lintel lint --root ../widget --output json"
    )]
    Lint {
        #[arg(long, help = "Project root (default: current dir)")]
        root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Descend into git submodules")]
        include_submodules: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Descend into subprojects/")]
        include_subprojects: bool,
    },
    /// Write metadata headers into files
    #[command(
        about = "Add or update license headers",
        long_about = "Synthesize a commented metadata header for each given file. Binary files \
and --sidecar write a <file>.license sidecar instead.",
        after_help = "Examples:\n  lintel annotate --copyright \"2024 Jane Doe\" --license MIT src/*.rs\n  lintel annotate --license CC0-1.0 --sidecar assets/logo.png"
    )]
    Annotate {
        #[arg(required = true, help = "Files to annotate")]
        paths: Vec<PathBuf>,
        #[arg(short = 'c', long, help = "Copyright statement (repeatable)")]
        copyright: Vec<String>,
        #[arg(short = 'l', long, help = "SPDX license expression")]
        license: Option<String>,
        #[arg(long, help = "Force a comment style by name (e.g. c, hash, html)")]
        style: Option<String>,
        #[arg(long, help = "Header mode: replace|append (default: replace)")]
        mode: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write a .license sidecar instead of editing the file")]
        sidecar: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Force single-line comment form")]
        single_line: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Force multi-line comment form")]
        multi_line: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not keep copyright/license lines from a replaced header")]
        no_merge: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Overwrite headers even when a file is already tagged")]
        force: bool,
        #[arg(long, help = "Header template text with {{ copyright }} and {{ license }} slots")]
        template_text: Option<String>,
    },
    /// Emit a machine-readable bill-of-materials
    #[command(
        about = "Print a tag-value bill-of-materials",
        long_about = "Scan the project tree and enumerate every file with its resolved \
copyright/license relationship in SPDX tag-value form."
    )]
    Bom {
        #[arg(long, help = "Project root (default: current dir)")]
        root: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Descend into git submodules")]
        include_submodules: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Descend into subprojects/")]
        include_subprojects: bool,
    },
}
