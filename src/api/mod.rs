//! Torrent sources and the contract aggregators drive them through
//!
//! - AniLibria: resolves AniList ids to AniLibria codes and lists their torrents

pub mod anilibria;

pub use anilibria::AniLibriaSource;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnimeQuery, TorrentResult};

/// Source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No anilistId provided")]
    MissingAnilistId,

    #[error("No titles provided")]
    MissingTitles,

    #[error("Provider returned HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

impl SourceError {
    /// Caller supplied an unusable query
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            SourceError::MissingAnilistId | SourceError::MissingTitles
        )
    }
}

/// Operations a source supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Single,
    Batch,
    Movie,
    Validate,
}

/// Contract between the aggregator and a single torrent source
#[async_trait]
pub trait TorrentSource: Send + Sync {
    /// Human readable source name
    fn name(&self) -> &str;

    fn capabilities(&self) -> &[Capability];

    /// Torrents for one episode (or the whole title if no episode is given)
    async fn single(&self, query: &AnimeQuery) -> Result<Vec<TorrentResult>, SourceError>;

    /// Whole-season releases; the episode filter is never forwarded
    async fn batch(&self, query: &AnimeQuery) -> Result<Vec<TorrentResult>, SourceError>;

    /// Movie releases; the episode filter is never forwarded
    async fn movie(&self, query: &AnimeQuery) -> Result<Vec<TorrentResult>, SourceError>;

    /// Health check, never fails
    async fn validate(&self) -> bool;
}
