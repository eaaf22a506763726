pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

use std::io::IsTerminal;

use tracing::Level;

/// Install the stderr subscriber. `verbose` raises the level from WARN to INFO.
pub fn init(verbose: bool) {
    let level = if verbose { Level::INFO } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}
