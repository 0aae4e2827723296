//! sssig-translate - compile secret-detection rules for multiple scanners
//!
//! # Usage
//!
//! ```bash
//! # Translate a rules document for one backend
//! sssig-translate rules.yml --target gitleaks > gitleaks.toml
//!
//! # Warnings about dropped capabilities go to stderr
//! sssig-translate rules.yml -t kingfisher 2> warnings.log
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use sssig_translate::{targets, Backend, RuleSet};

/// Print version information
fn print_version() {
    println!("sssig-translate {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message
fn print_help() {
    println!(
        r#"sssig-translate - compile secret-detection rules for multiple scanners

USAGE:
    sssig-translate [OPTIONS] <rulespath>

ARGS:
    <rulespath>             Path to the rules yaml document

OPTIONS:
    -h, --help              Print this help message
    -v, --version           Print version information
    -t, --target BACKEND    Backend to translate for: github, gitleaks,
                            kingfisher, noseyparker, trufflehog

The translated document is written to stdout; warnings about rule
capabilities the chosen backend cannot express are written to stderr.
"#
    );
}

/// Parse command line arguments
struct Args {
    help: bool,
    version: bool,
    target: Option<String>,
    rulespath: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args {
            help: false,
            version: false,
            target: None,
            rulespath: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "-t" | "--target" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.target = Some(args[i].clone());
                    }
                }
                arg if arg.starts_with("--target=") => {
                    result.target = Some(arg.trim_start_matches("--target=").to_string());
                }
                arg if !arg.starts_with('-') => result.rulespath = Some(PathBuf::from(arg)),
                _ => {}
            }
            i += 1;
        }

        result
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let Some(rulespath) = args.rulespath else {
        eprintln!("Error: missing rules path (see --help)");
        return ExitCode::FAILURE;
    };

    let Some(target) = args.target else {
        eprintln!("Error: missing --target (see --help)");
        return ExitCode::FAILURE;
    };

    let Some(backend) = Backend::from_str(&target) else {
        eprintln!(
            "Error: unknown target {:?}; expected one of: github, gitleaks, kingfisher, noseyparker, trufflehog",
            target
        );
        return ExitCode::FAILURE;
    };

    let ruleset = match RuleSet::from_file(&rulespath) {
        Ok(ruleset) => ruleset,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match targets::render(backend, &ruleset.rules) {
        Ok(rendered) => {
            for warning in &rendered.warnings {
                eprintln!("Warning: {}", warning);
            }
            print!("{}", rendered.text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
