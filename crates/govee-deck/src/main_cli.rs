//! Govee Deck CLI — list Govee devices and send test commands.
//!
//! Uses the same client as the Stream Deck actions, so a working `control`
//! here means the key will work too.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use govee_deck_lib::config::Config;

mod cli;

#[derive(Parser)]
#[command(
    name = "govee-deck-cli",
    version,
    about = "Diagnostics for Govee lights controlled from a Stream Deck"
)]
struct Args {
    /// Config file to read instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log requests and responses to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let (config, warnings) = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }

    match cli::run(args.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(cli::exit_status(&e))
        }
    }
}
