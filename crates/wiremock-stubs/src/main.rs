//! WireMock stub mapping tool.
//!
//! Checks mapping files before they are loaded into a server, rewrites them
//! in normalized form, and bundles a directory of mappings into a single
//! import document.
//!
//! Usage:
//!   wiremock-stubs check <directory_or_file> [OPTIONS]
//!   wiremock-stubs normalize <file> [--in-place]
//!   wiremock-stubs bundle <directory> [--output import.json]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wiremock_stubs::document::{self, mapping_files};
use wiremock_stubs::stubbing::StubImportBuilder;
use wiremock_stubs::{check_directory, normalize, CheckIssue, CheckOptions, CheckResult, Severity};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Parser, Debug)]
#[command(name = "wiremock-stubs")]
#[command(author, version, about = "Check, normalize and bundle WireMock stub mappings")]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate mapping files (JSON or YAML)
    Check {
        /// Mapping file or directory of mapping files
        path: PathBuf,

        /// Output format
        #[arg(
            short,
            long,
            value_enum,
            default_value = "text",
            env = "WIREMOCK_STUBS_OUTPUT"
        )]
        output: OutputFormat,

        /// Only show errors (hide warnings)
        #[arg(short = 'e', long)]
        errors_only: bool,

        /// Strict mode - treat warnings as errors
        #[arg(short, long)]
        strict: bool,

        /// Do not warn about mappings that differ from their normalized form
        #[arg(long)]
        allow_drift: bool,
    },

    /// Print a mapping file in normalized form
    Normalize {
        file: PathBuf,

        /// Rewrite the file instead of printing it
        #[arg(short, long)]
        in_place: bool,
    },

    /// Combine mapping files into one import document
    Bundle {
        /// Mapping file or directory of mapping files
        path: PathBuf,

        /// Keep existing stubs with the same id instead of overwriting them
        #[arg(long)]
        ignore_existing: bool,

        /// Remove stubs on the server that are not part of the bundle
        #[arg(long)]
        delete_all_not_in_import: bool,

        /// Write the bundle to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Check {
            path,
            output,
            errors_only,
            strict,
            allow_drift,
        } => {
            let options = CheckOptions {
                report_normalization_drift: !allow_drift,
            };
            let result = check_directory(&path, &options);
            match output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                OutputFormat::Text => print_results(&path, &result, errors_only),
            }
            let failed = result.errors > 0 || (strict && result.warnings > 0);
            std::process::exit(if failed { 1 } else { 0 });
        }
        Command::Normalize { file, in_place } => normalize_file(&file, in_place),
        Command::Bundle {
            path,
            ignore_existing,
            delete_all_not_in_import,
            output,
        } => bundle(
            &path,
            ignore_existing,
            delete_all_not_in_import,
            output.as_deref(),
        ),
    }
}

fn render(value: &Value, yaml: bool) -> Result<String> {
    if yaml {
        Ok(serde_yaml::to_string(value)?)
    } else {
        Ok(serde_json::to_string_pretty(value)? + "\n")
    }
}

fn normalize_file(file: &Path, in_place: bool) -> Result<()> {
    let value = document::read_document(file)?;
    let normalized = document::normalize_document(value)
        .with_context(|| format!("Failed to load mappings from {}", file.display()))?;
    let rendered = render(&normalized, document::is_yaml(file))?;

    if in_place {
        std::fs::write(file, rendered)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        eprintln!("{GREEN}Normalized: {}{RESET}", file.display());
    } else {
        print!("{rendered}");
    }
    Ok(())
}

fn bundle(
    path: &Path,
    ignore_existing: bool,
    delete_all_not_in_import: bool,
    output: Option<&Path>,
) -> Result<()> {
    let files = mapping_files(path)
        .with_context(|| format!("Failed to read directory {}", path.display()))?;
    if files.is_empty() {
        bail!("No mapping files found in {}", path.display());
    }

    let mut builder = StubImportBuilder::new();
    for file in &files {
        let value = document::read_document(file)?;
        let mappings = document::mappings_in(value)
            .with_context(|| format!("Failed to load mappings from {}", file.display()))?;
        for mapping in mappings {
            builder = builder.stub_mapping(mapping);
        }
    }
    if ignore_existing {
        builder = builder.ignore_existing();
    }
    if delete_all_not_in_import {
        builder = builder.delete_all_existing_stubs_not_in_import();
    }

    let import = builder.build()?;
    let rendered = render(&normalize(&import)?, false)?;
    match output {
        Some(output) => {
            std::fs::write(output, rendered)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!(
                "{GREEN}Bundled {} mapping(s) from {} file(s) into {}{RESET}",
                import.mappings().len(),
                files.len(),
                output.display()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn print_results(path: &Path, result: &CheckResult, errors_only: bool) {
    println!("{BOLD}{CYAN}WireMock Stub Mapping Check{RESET}");
    println!("{DIM}{RULE}{RESET}");
    println!("{DIM}Scanning:{RESET} {CYAN}{}{RESET}", path.display());
    println!();

    if result.issues.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
    } else {
        let mut issues_by_file: BTreeMap<&PathBuf, Vec<&CheckIssue>> = BTreeMap::new();
        for issue in &result.issues {
            if errors_only && issue.severity != Severity::Error {
                continue;
            }
            issues_by_file.entry(&issue.file).or_default().push(issue);
        }

        for (file, issues) in issues_by_file {
            let file_errors = issues
                .iter()
                .filter(|i| i.severity == Severity::Error)
                .count();
            let file_warnings = issues.len() - file_errors;

            let status_indicator = if file_errors > 0 {
                format!("{RED}FAIL{RESET}")
            } else {
                format!("{YELLOW}WARN{RESET}")
            };

            let counts = if file_errors > 0 && file_warnings > 0 {
                format!(
                    " {DIM}({RED}{file_errors} error(s){RESET}{DIM}, {YELLOW}{file_warnings} warning(s){RESET}{DIM}){RESET}"
                )
            } else if file_errors > 0 {
                format!(" {DIM}({RED}{file_errors} error(s){RESET}{DIM}){RESET}")
            } else {
                format!(" {DIM}({YELLOW}{file_warnings} warning(s){RESET}{DIM}){RESET}")
            };

            println!(
                "{status_indicator} {BOLD}{CYAN}{}{RESET}{counts}",
                file.display()
            );

            for issue in issues {
                let color = severity_color(issue.severity);
                let location_str = issue
                    .location
                    .as_ref()
                    .map(|l| format!("{DIM}[{RESET}{CYAN}{l}{RESET}{DIM}]{RESET} "))
                    .unwrap_or_default();

                println!(
                    "  {color}|{RESET} {location_str}{BOLD}{color}{}{RESET}: {} {DIM}({color}{}{DIM}){RESET}",
                    issue.severity.label(),
                    issue.message,
                    issue.code
                );

                if let Some(suggestion) = &issue.suggestion {
                    println!("  {color}|{RESET}   {GREEN}-> {suggestion}{RESET}");
                }
            }
            println!();
        }
    }

    println!("{DIM}{RULE}{RESET}");
    println!("{BOLD}{CYAN}Summary{RESET}");
    println!("{DIM}{RULE}{RESET}");
    println!(
        "  {DIM}Files checked:{RESET}    {BOLD}{}{RESET}",
        result.files_checked
    );
    println!(
        "  {DIM}Mappings loaded:{RESET}  {BOLD}{}{RESET}",
        result.mappings_checked
    );

    if result.errors > 0 {
        println!("  {RED}Errors:{RESET}           {BOLD}{RED}{}{RESET}", result.errors);
    } else {
        println!("  {GREEN}Errors:{RESET}           {BOLD}{GREEN}0{RESET}");
    }

    if result.warnings > 0 {
        println!(
            "  {YELLOW}Warnings:{RESET}         {BOLD}{YELLOW}{}{RESET}",
            result.warnings
        );
    } else {
        println!("  {DIM}Warnings:{RESET}         {BOLD}0{RESET}");
    }

    println!();

    if result.errors == 0 && result.warnings == 0 {
        println!("{GREEN}{BOLD}All checks passed!{RESET}");
    } else if result.errors == 0 {
        println!("{YELLOW}{BOLD}Passed with warnings{RESET}");
    } else {
        println!("{RED}{BOLD}Check failed with errors{RESET}");
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
    }
}
