//! Lintel CLI binary entry point.
//! Delegates to the library for scanning, reporting, and annotation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lintel::cli::{Cli, Commands};
use lintel::comment;
use lintel::config::{self, AnnotateDefaults};
use lintel::expression;
use lintel::header::{self, CommentForm, HeaderInput, HeaderOptions, PathOutcome, WriteMode};
use lintel::output;
use lintel::report::ComplianceReport;
use lintel::scan;
use lintel::utils::{error_prefix, note_prefix, warn_prefix};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Lint {
            root,
            output,
            include_submodules,
            include_subprojects,
        } => run_lint(root, output, include_submodules, include_subprojects),
        Commands::Annotate {
            paths,
            copyright,
            license,
            style,
            mode,
            sidecar,
            single_line,
            multi_line,
            no_merge,
            force,
            template_text,
        } => run_annotate(AnnotateArgs {
            paths,
            copyright,
            license,
            style,
            mode,
            sidecar,
            single_line,
            multi_line,
            no_merge,
            force,
            template_text,
        }),
        Commands::Bom {
            root,
            include_submodules,
            include_subprojects,
        } => run_bom(root, include_submodules, include_subprojects),
    }
}

fn resolve_or_die(
    root: Option<&str>,
    output: Option<&str>,
    include_submodules: bool,
    include_subprojects: bool,
) -> config::Effective {
    let eff = config::resolve_effective(
        root,
        output,
        if include_submodules { Some(true) } else { None },
        if include_subprojects { Some(true) } else { None },
    );
    match eff {
        Ok(eff) => eff,
        Err(err) => {
            eprintln!("{} {}", error_prefix(), err);
            std::process::exit(2);
        }
    }
}

fn run_lint(
    root: Option<String>,
    output: Option<String>,
    include_submodules: bool,
    include_subprojects: bool,
) {
    let eff = resolve_or_die(
        root.as_deref(),
        output.as_deref(),
        include_submodules,
        include_subprojects,
    );
    if eff.output != "json" && !eff.config_found {
        eprintln!("{} {}", note_prefix(), "No lintel.toml found; using defaults.");
    }
    let index = match scan::scan(&eff.root, &eff.scan) {
        Ok(index) => index,
        Err(err) => {
            eprintln!("{} {}", error_prefix(), err);
            std::process::exit(2);
        }
    };
    let report = ComplianceReport::from_index(&index);
    output::print_report(&report, &eff.output);
    if !report.is_compliant() {
        std::process::exit(1);
    }
}

fn run_bom(root: Option<String>, include_submodules: bool, include_subprojects: bool) {
    let eff = resolve_or_die(root.as_deref(), None, include_submodules, include_subprojects);
    let index = match scan::scan(&eff.root, &eff.scan) {
        Ok(index) => index,
        Err(err) => {
            eprintln!("{} {}", error_prefix(), err);
            std::process::exit(2);
        }
    };
    output::print_bom(&index);
}

struct AnnotateArgs {
    paths: Vec<PathBuf>,
    copyright: Vec<String>,
    license: Option<String>,
    style: Option<String>,
    mode: Option<String>,
    sidecar: bool,
    single_line: bool,
    multi_line: bool,
    no_merge: bool,
    force: bool,
    template_text: Option<String>,
}

fn build_header_options(args: &AnnotateArgs, defaults: &AnnotateDefaults) -> HeaderOptions {
    let mode_str = args.mode.clone().unwrap_or_else(|| defaults.mode.clone());
    let mode = match mode_str.as_str() {
        "replace" => WriteMode::Replace,
        "append" => WriteMode::Append,
        other => {
            eprintln!("{} unknown mode '{other}' (expected replace|append)", error_prefix());
            std::process::exit(2);
        }
    };
    if args.single_line && args.multi_line {
        eprintln!(
            "{} --single-line and --multi-line are mutually exclusive",
            error_prefix()
        );
        std::process::exit(2);
    }
    let forced_form = if args.single_line {
        Some(CommentForm::SingleLine)
    } else if args.multi_line {
        Some(CommentForm::MultiLine)
    } else {
        None
    };
    let style_name = args.style.clone().or_else(|| defaults.style.clone());
    let forced_style = match style_name {
        Some(name) => match comment::by_name(&name) {
            Some(style) => Some(style),
            None => {
                eprintln!("{} unknown comment style '{name}'", error_prefix());
                std::process::exit(2);
            }
        },
        None => None,
    };
    HeaderOptions {
        mode,
        merge_copyrights: !args.no_merge && defaults.merge_copyrights,
        skip_existing: !args.force && defaults.skip_existing,
        sidecar: args.sidecar || defaults.sidecar,
        forced_style,
        forced_form,
    }
}

fn run_annotate(args: AnnotateArgs) {
    let eff = resolve_or_die(None, None, false, false);
    let opts = build_header_options(&args, &eff.annotate);

    let expression = match &args.license {
        Some(raw) => match expression::parse(raw) {
            Ok(expr) => Some(expr),
            Err(err) => {
                eprintln!("{} {}", error_prefix(), err);
                std::process::exit(2);
            }
        },
        None => None,
    };
    let copyrights: BTreeSet<String> = args.copyright.iter().cloned().collect();
    if copyrights.is_empty() && expression.is_none() {
        eprintln!(
            "{} nothing to write: pass --copyright and/or --license",
            error_prefix()
        );
        std::process::exit(2);
    }
    let input = HeaderInput {
        copyrights: &copyrights,
        expression: expression.as_ref(),
        template: args.template_text.as_deref(),
    };

    let color = std::env::var_os("NO_COLOR").is_none();
    let mut failures = 0usize;
    for result in header::annotate_many(&args.paths, &input, &opts) {
        match result {
            PathOutcome::Done(outcome) => {
                let target = outcome.target.display();
                if let Some(reason) = outcome.skipped {
                    if color {
                        println!("{} {} ({reason})", "⏭️  skipped:".yellow().bold(), target);
                    } else {
                        println!("⏭️  skipped: {target} ({reason})");
                    }
                } else if outcome.changed {
                    if color {
                        println!("{} {}", "✏️  annotated:".green().bold(), target);
                    } else {
                        println!("✏️  annotated: {target}");
                    }
                } else {
                    println!("no changes: {target}");
                }
            }
            PathOutcome::StyleSkipped { path, error } => {
                eprintln!("{} {}: {error}", warn_prefix(), path.display());
            }
            PathOutcome::Failed { path, error } => {
                eprintln!("{} {}: {error}", error_prefix(), path.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
}
