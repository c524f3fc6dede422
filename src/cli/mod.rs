//! The sqldoc Command-Line Interface.
//!
//! Parses arguments, builds the logging subscriber and the reporter, and hands
//! the file to the test runner.

use crate::cli::args::DoctestArgs;
use crate::errors::DoctestError;
use crate::test::report::Reporter;
use crate::test::runner::TestRunner;
use crate::test::{HarnessConfig, RunSummary};
use clap::Parser;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() -> miette::Result<()> {
    let args = DoctestArgs::parse();
    run_with(&args)?;
    Ok(())
}

/// Runs one file with already-parsed arguments.
///
/// The subscriber is scoped to this call rather than installed globally.
pub fn run_with(args: &DoctestArgs) -> Result<RunSummary, DoctestError> {
    let config = HarnessConfig {
        use_colors: !args.no_color && HarnessConfig::default().use_colors,
        strict: args.strict,
        ..HarnessConfig::default()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level.filter())
        .with_writer(std::io::stderr)
        .with_ansi(!args.no_color && atty::is(atty::Stream::Stderr))
        .without_time()
        .with_target(false)
        .with_level(false)
        .finish();

    let mut reporter = Reporter::stdout(config);
    tracing::subscriber::with_default(subscriber, || {
        TestRunner::run_file(&args.path, &mut reporter)
    })
}
