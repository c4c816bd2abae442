mod cli_args;
mod commands;

use anyhow::Result;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli_args::{parse_cli_action, print_help, CliAction};

fn main() -> Result<()> {
    let options = match parse_cli_action()? {
        CliAction::Help => {
            print_help();
            return Ok(());
        }
        CliAction::Run(options) => options,
    };

    init_tracing(options.verbosity);

    let output = commands::run(&options)?;
    println!("{output}");
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // stdout carries the JSON output, logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Tracing initialized with level: {}", level);
}
