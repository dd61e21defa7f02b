//! anisearch - AniLibria torrent source
//!
//! # Usage
//!
//! ```bash
//! anisearch single -a 154587 -t "Sousou no Frieren" -e 5
//! anisearch batch -a 154587 -t "Sousou no Frieren" --json
//! anisearch validate
//! ```

use clap::Parser;
use tracing::Level;

use anisearch::api::AniLibriaSource;
use anisearch::cli::{Cli, Command, ExitCode, Output};
use anisearch::commands;
use anisearch::config::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    run_cli(cli).await.into()
}

/// Log to stderr so stdout stays parseable
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config_path = cli.config.clone().or_else(Config::path);
    let stored = Config::stored_or_default(config_path.as_deref());
    let mut config = stored.clone().apply_env();
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }

    let source = AniLibriaSource::from_config(&config);

    match cli.command {
        Command::Single(cmd) => commands::single_cmd(cmd, &source, &output).await,

        Command::Batch(args) => commands::batch_cmd(args, &source, &output).await,

        Command::Movie(args) => commands::movie_cmd(args, &source, &output).await,

        Command::Resolve(args) => commands::resolve_cmd(args, &source, &output).await,

        Command::Validate => commands::validate_cmd(&source, &output).await,

        Command::Config(cmd) => {
            commands::config_cmd(cmd, &config, &stored, config_path.as_deref(), &output)
        }
    }
}
