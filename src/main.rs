use std::process::ExitCode;

use colored::Colorize;
use json_msggen::cli::CommandLineInterface;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "JSON_MSGGEN_LOG";

fn init_tracing(filter: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn main() -> ExitCode {
    let command_line_interface = CommandLineInterface::load();
    let filter = command_line_interface
        .log_filter
        .clone()
        .or_else(|| std::env::var(LOG_ENV).ok())
        .unwrap_or_else(|| "warn".to_owned());
    init_tracing(&filter);

    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
