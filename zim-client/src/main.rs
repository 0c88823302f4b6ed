use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use zim_client::{Commands, commands};

#[derive(Parser)]
#[command(
    name = "zim",
    about = "Reader for ZIM archive containers",
    version,
    author,
    long_about = "A command-line tool for inspecting ZIM archives: header and pointer \
                  metadata, directory entries, decompressed clusters, and full extraction, \
                  emitted as newline-delimited JSON."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Archive to stream when no subcommand is given
    filename: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing on stderr; stdout carries only records
    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = match (cli.command, cli.filename) {
        (Some(command), _) => command,
        (None, Some(filename)) => Commands::Stream { filename },
        (None, None) => {
            let _ = Cli::command().print_help();
            return ExitCode::from(2);
        }
    };

    match commands::handle(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
