//! Defines the command-line arguments for the sqldoc CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "sqldoc",
    version,
    about = "Run the queries in an annotated SQL file and check their results."
)]
pub struct DoctestArgs {
    /// SQL file to run
    pub path: PathBuf,

    /// Root logging level
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        ignore_case = true,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,

    /// Never colour result tables or log output
    #[arg(long)]
    pub no_color: bool,

    /// Exit with an error when any test fails
    #[arg(long)]
    pub strict: bool,
}

/// Log levels accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[value(name = "CRITICAL")]
    Critical,
    #[value(name = "ERROR")]
    Error,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "INFO")]
    Info,
    #[value(name = "DEBUG")]
    Debug,
}

impl LogLevel {
    /// Fatal errors are logged at `ERROR`, so CRITICAL and ERROR coincide.
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }
}
