use std::env;
use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ticklist::cli::commands::Cli;
use ticklist::cli::handlers;

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TICKLIST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "ticklist=debug"
        } else {
            "ticklist=warn"
        })
    });

    let format = env::var("TICKLIST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output (and --json), so logs go to stderr
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_ansi(std::io::stderr().is_terminal())
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
