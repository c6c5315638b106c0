//! Pipe controller CLI - fork a child and feed it over an anonymous pipe

mod cli;
mod commands;
mod logging;
mod runner;

use clap::Parser;
use cli::Cli;
use commands::list_variants;
use console::style;
use runner::{RunConfig, run_session};

fn main() {
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    if cli.list_variants {
        list_variants();
        return;
    }

    let config = RunConfig {
        message: cli.message,
        hex: cli.hex,
        variant: cli.variant.into(),
        framing: cli.framing.into(),
        shift: cli.shift,
        wait: cli.wait,
        json: cli.json,
    };

    // Failures still exit 0 unless --strict
    if let Err(e) = run_session(config) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        if cli.strict {
            std::process::exit(1);
        }
    }
}
