use std::process::ExitCode;

use lintdispatch::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse_or_usage();
    lintdispatch::init(cli.verbose);

    match lintdispatch::cli::run(cli) {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
