//! sqldoc CLI entry point

fn main() -> miette::Result<()> {
    sqldoc::cli::run()
}
