use std::path::Path;

use {
    anyhow::Result,
    muster_config::{MusterConfig, Severity, validate},
    muster_directory::{AccountDirectory, ChannelDirectory},
};

use crate::run_commands::delimiter_byte;

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Print both sources as they will be used by `muster run`.
pub fn list(config: &MusterConfig) -> Result<()> {
    let delimiter = delimiter_byte(config.data.delimiter)?;
    let accounts = AccountDirectory::load(&config.data.sessions, delimiter)?;
    let channels = ChannelDirectory::load(&config.data.channels, delimiter)?;

    println!("{BOLD}Accounts{RESET} ({})", accounts.len());
    for session in accounts.sessions() {
        println!("  {session}");
    }

    println!("\n{BOLD}Channels{RESET} ({})", channels.len());
    for (id, entry) in channels.iter() {
        println!("  {id:<16} {:<32} {}", entry.display_name, entry.invite_token);
    }
    Ok(())
}
