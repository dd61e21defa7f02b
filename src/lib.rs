//! anisearch - AniLibria torrent source
//!
//! Resolves AniList titles to AniLibria releases and lists their torrents
//! in the normalized shape anime search aggregators consume.
//!
//! # Modules
//!
//! - `models` - Queries, resolved codes, torrent results
//! - `api` - The source contract and the AniLibria source
//! - `config` - Endpoint and strategy configuration
//! - `cli` / `commands` - The `anisearch` command line

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;

// Re-export commonly used types
pub use models::{
    Accuracy, AnimeQuery, ResolveStrategy, ResolvedCode, TorrentKind, TorrentResult,
};

pub use api::{AniLibriaSource, Capability, SourceError, TorrentSource};
pub use config::Config;
