//! `inistore`: inspect and edit a device configuration file.
//!
//! # Usage
//!
//! ```text
//! inistore [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show    Print every field
//!   get     Print one field
//!   set     Change one field and store the file
//!   reset   Store the defaults
//!   check   Report malformed lines, unknown keys and invalid values
//!
//! Options:
//!   -f, --file <PATH>        Backing file [default: device.ini]
//!       --atomic             Write a temporary file and rename it into place
//!       --log-level <FILTER> Log filter, e.g. `debug` or `inistore_core=trace`
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Default      | Description                 |
//! |-------------------|--------------|-----------------------------|
//! | `INISTORE_FILE`   | `device.ini` | Backing file                |
//! | `INISTORE_ATOMIC` | `false`      | Same as `--atomic`          |
//! | `INISTORE_LOG`    | (unset)      | Same as `--log-level`       |
//!
//! Without `--log-level`, `RUST_LOG` is honoured, falling back to `info`.
//! Logs go to stderr; command output goes to stdout.
//!
//! # Exit status
//!
//! `0` on success, `1` on errors or when `check` finds problems, `2` when
//! `get` or `set` names an unknown field.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inistore_core::{ConfigManager, Schema, WriteMode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use inistore_cli::commands;
use inistore_cli::DeviceSettings;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect and edit an inistore device configuration file.
#[derive(Debug, Parser)]
#[command(name = "inistore", version)]
struct Cli {
    /// Path of the backing INI file.
    #[arg(short, long, default_value = "device.ini", env = "INISTORE_FILE")]
    file: PathBuf,

    /// Store through a temporary file renamed over the target, so a failed
    /// write keeps the previous contents.
    #[arg(long, env = "INISTORE_ATOMIC")]
    atomic: bool,

    /// `tracing` filter directive; overrides `RUST_LOG`.
    #[arg(long, env = "INISTORE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every field with its current value.
    Show {
        /// Emit JSON with boxed values instead of `name = value` lines.
        #[arg(long)]
        json: bool,
    },
    /// Print one field, addressed by its fully qualified name.
    Get {
        name: String,
        /// Emit the boxed value as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Change one field and store the file if the value differs.
    Set { name: String, value: String },
    /// Store the default values.
    Reset,
    /// Report problems in the file without changing it.
    Check,
}

impl Cli {
    fn write_mode(&self) -> WriteMode {
        if self.atomic {
            WriteMode::Replace
        } else {
            WriteMode::Truncate
        }
    }
}

/// Exit status when `get` or `set` names a field the table does not have.
const EXIT_UNKNOWN_FIELD: u8 = 2;

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // `--log-level` wins over `RUST_LOG`; both fall back to `info`.
    let filter = match cli.log_level.as_deref() {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter {directives:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(file = %cli.file.display(), mode = ?cli.write_mode(), "inistore starting");

    let mut config = ConfigManager::new(&cli.file, DeviceSettings::default())
        .with_write_mode(cli.write_mode());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Show { json } => {
            config.load();
            commands::show(&config, json, &mut out)?;
        }
        Command::Get { name, json } => {
            config.load();
            if let Err(e) = commands::get(&config, &name, json, &mut out) {
                return unknown_field_exit(e);
            }
        }
        Command::Set { name, value } => {
            config.load();
            match commands::set(&mut config, &name, &value) {
                Ok(result) => writeln!(out, "{name}: {result}")?,
                Err(e) => return unknown_field_exit(e),
            }
        }
        Command::Reset => commands::reset(&mut config)?,
        Command::Check => {
            let problems = commands::check(&config, &mut out)?;
            if problems > 0 {
                writeln!(out, "{problems} problem(s) found")?;
                return Ok(ExitCode::FAILURE);
            }
            writeln!(out, "{}: ok", cli.file.display())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Maps an unknown field name to [`EXIT_UNKNOWN_FIELD`] and lists the valid
/// names; every other error propagates.
fn unknown_field_exit(error: anyhow::Error) -> anyhow::Result<ExitCode> {
    if !commands::is_unknown_field(&error) {
        return Err(error);
    }
    eprintln!("error: {error}");
    eprintln!("known fields:");
    for descriptor in DeviceSettings::descriptors() {
        eprintln!("  {}", descriptor.name());
    }
    Ok(ExitCode::from(EXIT_UNKNOWN_FIELD))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
