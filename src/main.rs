mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod records;
mod settings;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, RecordsCommands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "finsift=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Inspect { file, json } => cli::inspect::run(&file, json),
        Commands::Import {
            file,
            overrides,
            shape,
            year,
            json,
            commit,
        } => cli::import::run(cli::import::ImportArgs {
            file,
            overrides,
            shape,
            year,
            json,
            commit,
        }),
        Commands::Records { command } => match command {
            RecordsCommands::List { json } => cli::records::list(json),
            RecordsCommands::Delete { id } => cli::records::delete(id),
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
