//! CLI - Command Line Interface for anisearch
//!
//! Every source operation is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Torrents for one episode
//! anisearch single -a 154587 -t "Sousou no Frieren" -e 5
//!
//! # Whole-season releases, resolving by AniList id
//! anisearch --strategy id-lookup batch -a 154587 -t "Sousou no Frieren"
//!
//! # Health check
//! anisearch validate --json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::{AnimeQuery, ResolveStrategy};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Source failed its health check
    Unavailable = 3,
    /// Nothing resolved or no torrents listed
    NoResults = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// anisearch - AniLibria torrent source
#[derive(Parser, Debug)]
#[command(
    name = "anisearch",
    version,
    about = "Find AniLibria torrents for an AniList title",
    after_help = "EXAMPLES:\n\
                  anisearch single -a 154587 -t Frieren -e 5   One episode\n\
                  anisearch batch -a 154587 -t Frieren         Whole season\n\
                  anisearch validate --json                    Health check"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured resolve strategy
    #[arg(long, global = true, value_enum)]
    pub strategy: Option<StrategyArg>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

/// Resolve strategy as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    TitleSearch,
    IdLookup,
}

impl From<StrategyArg> for ResolveStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::TitleSearch => ResolveStrategy::TitleSearch,
            StrategyArg::IdLookup => ResolveStrategy::IdLookup,
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Torrents for a single episode
    #[command(visible_alias = "s")]
    Single(SingleCmd),

    /// Whole-season (batch) torrents
    #[command(visible_alias = "b")]
    Batch(QueryArgs),

    /// Movie torrents
    #[command(visible_alias = "m")]
    Movie(QueryArgs),

    /// Resolve an AniList id to the AniLibria code/id
    #[command(visible_alias = "r")]
    Resolve(QueryArgs),

    /// Check the source is reachable
    Validate,

    /// Show the effective configuration
    Config(ConfigCmd),
}

/// Title identification shared by every lookup command
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// AniList id of the title
    #[arg(long, short = 'a')]
    pub anilist_id: Option<u32>,

    /// Display title (repeatable, first is preferred)
    #[arg(long = "title", short = 't')]
    pub titles: Vec<String>,
}

impl QueryArgs {
    pub fn to_query(&self) -> AnimeQuery {
        AnimeQuery {
            anilist_id: self.anilist_id,
            titles: self.titles.clone(),
            episode: None,
        }
    }
}

/// Single-episode lookup
#[derive(Args, Debug, Clone)]
pub struct SingleCmd {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Episode number
    #[arg(long, short = 'e')]
    pub episode: Option<u32>,
}

impl SingleCmd {
    pub fn to_query(&self) -> AnimeQuery {
        AnimeQuery {
            episode: self.episode,
            ..self.query.to_query()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfigCmd {
    /// Write the stored configuration (without env or flag overrides) to the config path
    #[arg(long)]
    pub save: bool,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub source: String,
    pub ok: bool,
}

/// Resolve response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub anilist_id: u32,
    pub strategy: ResolveStrategy,
    pub resolved: crate::models::ResolvedCode,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print plain lines (text mode) or the serialized data (JSON mode)
    pub fn print_lines<T: Serialize>(&self, data: T, lines: &[String]) -> anyhow::Result<()> {
        if self.json {
            return self.print(data);
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verify CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_single_command() {
        let cli = Cli::parse_from([
            "anisearch", "single", "-a", "154587", "-t", "Frieren", "-e", "5",
        ]);
        if let Command::Single(cmd) = cli.command {
            let query = cmd.to_query();
            assert_eq!(query.anilist_id, Some(154587));
            assert_eq!(query.titles, vec!["Frieren".to_string()]);
            assert_eq!(query.episode, Some(5));
        } else {
            panic!("Expected Single command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "anisearch",
            "--json",
            "--quiet",
            "-vv",
            "--strategy",
            "id-lookup",
            "validate",
        ]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.strategy, Some(StrategyArg::IdLookup));
        assert!(matches!(cli.command, Command::Validate));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::Error), 1);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::Unavailable), 3);
        assert_eq!(i32::from(ExitCode::NoResults), 4);
    }

    #[test]
    fn test_json_output_omits_zero_exit_code() {
        let json = serde_json::to_value(JsonOutput::success(vec![1, 2])).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("exit_code").is_none());

        let err = serde_json::to_value(JsonOutput::<()>::error_msg("boom", ExitCode::NoResults))
            .unwrap();
        assert_eq!(err["error"], "boom");
        assert_eq!(err["exit_code"], 4);
    }
}
