/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * kakiage command-line interface
 */

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kakiage::{Expansion, FileSystemIncluder, Kakiage, Values};
use kakiage_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, SourceText};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod builtins;
mod config;

use builtins::Builtins;

#[derive(Parser, Debug)]
#[command(name = "kakiage")]
#[command(version, about = "Expand a kakiage text template", long_about = None)]
struct Cli {
    /// Template file to expand
    #[arg(
        value_name = "INPUT",
        conflicts_with = "source",
        required_unless_present = "source"
    )]
    input: Option<PathBuf>,

    /// Template text to expand instead of a file
    #[arg(short = 's', long = "source", value_name = "TEXT")]
    source: Option<String>,

    /// Definition file with NAME=VALUE lines (repeatable)
    #[arg(short = 'd', long = "definitions", value_name = "FILE")]
    definitions: Vec<PathBuf>,

    /// Single definition, applied after definition files (repeatable)
    #[arg(short = 'D', value_name = "NAME=VALUE")]
    defines: Vec<String>,

    /// Write output to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTML-escape substituted values
    #[arg(long)]
    html: bool,

    /// Treat warnings as errors and exit with status 1 on any error
    #[arg(long)]
    strict: bool,

    /// Directory include names are resolved against (default: the input's directory)
    #[arg(long, value_name = "DIR")]
    include_dir: Option<PathBuf>,

    /// Deepest include nesting allowed
    #[arg(long, value_name = "N", default_value_t = 10)]
    max_include_depth: usize,

    /// How to print diagnostics on stderr
    #[arg(long, value_enum, default_value_t = DiagnosticFormat::Text)]
    diagnostics: DiagnosticFormat,

    /// Verbose logging (-v for debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DiagnosticFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose > 0 {
        "kakiage=debug"
    } else {
        "kakiage=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let expansion = run(&cli)?;
    if cli.strict && expansion.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<Expansion> {
    let (name, source, base_dir) = match (&cli.input, &cli.source) {
        (_, Some(text)) => ("<source>".to_string(), text.clone(), PathBuf::from(".")),
        (Some(path), None) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (path.display().to_string(), text, dir)
        }
        (None, None) => anyhow::bail!("No template given; pass INPUT or --source"),
    };

    let values = load_values(cli)?;
    let include_dir = cli.include_dir.clone().unwrap_or(base_dir);
    tracing::debug!(include_dir = %include_dir.display(), values = values.len(), "expanding {}", name);

    let engine = Kakiage::new()
        .with_html_mode(cli.html)
        .with_strict_mode(cli.strict)
        .with_max_include_depth(cli.max_include_depth)
        .with_includer(FileSystemIncluder::new(include_dir))
        .with_evaluator(Builtins::new());
    let expansion = engine.expand(&source, &values);

    report(&expansion, cli.diagnostics, &name, &source);
    write_output(cli.output.as_deref(), &expansion.text)?;
    Ok(expansion)
}

fn load_values(cli: &Cli) -> Result<Values> {
    let mut values = Values::new();
    for path in &cli.definitions {
        let warnings = config::load_definitions(path, &mut values)?;
        for warning in warnings {
            let diagnostic = DiagnosticMessageBuilder::warning("Definition Syntax Error")
                .with_code("K-4-1")
                .problem(format!(
                    "Line {} of {} is not of the form NAME=VALUE",
                    warning.line,
                    path.display()
                ))
                .add_info(format!("The line reads `{}`", warning.text))
                .add_hint("Comment it out with `#` or `;`?")
                .build();
            print_diagnostic(&diagnostic, cli.diagnostics, None);
        }
    }
    for define in &cli.defines {
        let (name, value) = config::parse_define(define)?;
        values.insert(name, value);
    }
    Ok(values)
}

fn report(expansion: &Expansion, format: DiagnosticFormat, name: &str, source: &str) {
    let source = SourceText {
        name,
        content: source,
    };
    for diagnostic in &expansion.diagnostics {
        print_diagnostic(diagnostic, format, Some(source));
    }
}

fn print_diagnostic(
    diagnostic: &DiagnosticMessage,
    format: DiagnosticFormat,
    source: Option<SourceText<'_>>,
) {
    match format {
        DiagnosticFormat::Text => eprintln!("{}", diagnostic.to_text(source)),
        DiagnosticFormat::Json => eprintln!("{}", diagnostic.to_json()),
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("Failed to write output")?;
            stdout.flush().context("Failed to write output")
        }
    }
}
