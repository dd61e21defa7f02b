//! CLI Command Handlers
//!
//! Implements all CLI commands by driving the configured source.
//! Each handler takes CLI args and Output, returns ExitCode.

use std::path::Path;

use crate::api::{AniLibriaSource, SourceError, TorrentSource};
use crate::cli::{
    ConfigCmd, ExitCode, Output, QueryArgs, ResolveResponse, SingleCmd, ValidateResponse,
};
use crate::config::Config;
use crate::models::{AnimeQuery, TorrentResult};

/// Which source operation a lookup command maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Single,
    Batch,
    Movie,
}

// =============================================================================
// Torrent Lookups
// =============================================================================

pub async fn single_cmd(cmd: SingleCmd, source: &dyn TorrentSource, output: &Output) -> ExitCode {
    lookup_cmd(Lookup::Single, cmd.to_query(), source, output).await
}

pub async fn batch_cmd(args: QueryArgs, source: &dyn TorrentSource, output: &Output) -> ExitCode {
    lookup_cmd(Lookup::Batch, args.to_query(), source, output).await
}

pub async fn movie_cmd(args: QueryArgs, source: &dyn TorrentSource, output: &Output) -> ExitCode {
    lookup_cmd(Lookup::Movie, args.to_query(), source, output).await
}

async fn lookup_cmd(
    lookup: Lookup,
    query: AnimeQuery,
    source: &dyn TorrentSource,
    output: &Output,
) -> ExitCode {
    if let Some(title) = query.primary_title() {
        output.info(format!("Searching {} for: {}", source.name(), title));
    }

    let result = match lookup {
        Lookup::Single => source.single(&query).await,
        Lookup::Batch => source.batch(&query).await,
        Lookup::Movie => source.movie(&query).await,
    };

    match result {
        Ok(torrents) if torrents.is_empty() => {
            output.error("No torrents found", ExitCode::NoResults)
        }
        Ok(torrents) => print_torrents(&torrents, output),
        Err(e) => output.error(e.to_string(), exit_code_for(&e)),
    }
}

fn print_torrents(torrents: &[TorrentResult], output: &Output) -> ExitCode {
    let lines: Vec<String> = torrents
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{:>3}. {}\n     {}",
                i,
                t,
                t.link.as_deref().unwrap_or("(no hash)")
            )
        })
        .collect();

    if let Err(e) = output.print_lines(torrents, &lines) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

/// Map a source error to a CLI exit code
pub fn exit_code_for(err: &SourceError) -> ExitCode {
    if err.is_invalid_argument() {
        ExitCode::InvalidArgs
    } else {
        ExitCode::Error
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(args: QueryArgs, source: &AniLibriaSource, output: &Output) -> ExitCode {
    let query = args.to_query();
    let Some(anilist_id) = query.anilist_id() else {
        return output.error(
            SourceError::MissingAnilistId.to_string(),
            ExitCode::InvalidArgs,
        );
    };
    if query.titles.is_empty() {
        return output.error(SourceError::MissingTitles.to_string(), ExitCode::InvalidArgs);
    }

    match source.resolve_code(anilist_id, &query.titles).await {
        Some(resolved) => {
            let response = ResolveResponse {
                anilist_id,
                strategy: source.strategy(),
                resolved,
            };
            let line = response.resolved.to_string();
            if let Err(e) = output.print_lines(&response, &[line]) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        None => output.error(
            format!("No AniLibria title found for AniList id {}", anilist_id),
            ExitCode::NoResults,
        ),
    }
}

// =============================================================================
// Validate Command
// =============================================================================

pub async fn validate_cmd(source: &dyn TorrentSource, output: &Output) -> ExitCode {
    let ok = source.validate().await;
    let response = ValidateResponse {
        source: source.name().to_string(),
        ok,
    };
    let line = format!("{}: {}", response.source, if ok { "ok" } else { "unreachable" });

    if let Err(e) = output.print_lines(&response, &[line]) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    if ok {
        ExitCode::Success
    } else {
        ExitCode::Unavailable
    }
}

// =============================================================================
// Config Command
// =============================================================================

/// Print the effective config; `--save` writes the stored config only, so
/// env and flag overrides never end up in the file
pub fn config_cmd(
    cmd: ConfigCmd,
    config: &Config,
    stored: &Config,
    path: Option<&Path>,
    output: &Output,
) -> ExitCode {
    if cmd.save {
        let Some(path) = path else {
            return output.error("Could not determine config path", ExitCode::Error);
        };
        if let Err(e) = stored.save(path) {
            return output.error(format!("Failed to save config: {}", e), ExitCode::Error);
        }
        output.info(format!("Saved config to {}", path.display()));
    }

    if let Err(e) = output.print(config) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}
