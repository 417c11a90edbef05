//! social-recall CLI entry point.

use clap::Parser;
use recall::cli::commands;
use recall::cli::{Cli, Commands};
use recall::config::Settings;
use recall::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.quiet {
        recall::QUIET.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if let Some(hint) = e.hint() {
                eprintln!("Error: {e}\n  Hint: {hint}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,hyper=info,reqwest=info,h2=info,tower=info,ort=warn"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, Error> {
    let mut settings = Settings::load()?;
    if let Some(url) = &cli.qdrant_url {
        settings.qdrant_url.clone_from(url);
    }
    Ok(settings)
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Version => commands::version::execute(json),
        Commands::Completions { shell } => commands::completions::execute(shell),

        Commands::Store(args) => commands::store::execute(args, &load_settings(cli)?, json),
        Commands::Find(args) => commands::find::execute(args, &load_settings(cli)?, json),
        Commands::Collections => commands::collections::execute(&load_settings(cli)?, json),
        Commands::Model { load } => commands::model::execute(&load_settings(cli)?, *load, json),
    }
}
