//! Data structures and types for anisearch
//!
//! Contains the shared models used across the crate:
//! - **Query**: what the aggregator asks a source for
//! - **Resolution**: the provider's own identifier for a title
//! - **Results**: normalized torrent entries handed back to the aggregator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Query Models
// =============================================================================

/// A single lookup request from the aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeQuery {
    /// AniList identifier of the title (0 counts as missing)
    pub anilist_id: Option<u32>,
    /// Display titles, most preferred first
    #[serde(default)]
    pub titles: Vec<String>,
    /// Episode filter, only honoured by `single`
    pub episode: Option<u32>,
}

impl AnimeQuery {
    pub fn new<I, S>(anilist_id: u32, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            anilist_id: Some(anilist_id),
            titles: titles.into_iter().map(Into::into).collect(),
            episode: None,
        }
    }

    pub fn with_episode(mut self, episode: u32) -> Self {
        self.episode = Some(episode);
        self
    }

    /// AniList id, if present and non-zero
    pub fn anilist_id(&self) -> Option<u32> {
        self.anilist_id.filter(|id| *id > 0)
    }

    /// Episode, if present and non-zero
    pub fn episode(&self) -> Option<u32> {
        self.episode.filter(|ep| *ep > 0)
    }

    /// First display title
    pub fn primary_title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }
}

// =============================================================================
// Resolution Models
// =============================================================================

/// How an AniList id is turned into the provider's identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Search the title endpoint by primary display title, yields a `code`
    #[default]
    TitleSearch,
    /// Look the title up by AniList id, yields a numeric `id`
    IdLookup,
}

impl ResolveStrategy {
    /// Parse from config/env spelling ("title_search", "id-lookup", ...)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "title_search" | "search" | "title" => Some(ResolveStrategy::TitleSearch),
            "id_lookup" | "lookup" | "id" => Some(ResolveStrategy::IdLookup),
            _ => None,
        }
    }
}

impl fmt::Display for ResolveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveStrategy::TitleSearch => write!(f, "title_search"),
            ResolveStrategy::IdLookup => write!(f, "id_lookup"),
        }
    }
}

/// Provider-side identifier for a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedCode {
    /// Slug-like code returned by title search
    Code(String),
    /// Numeric id returned by id lookup
    Id(u64),
}

impl ResolvedCode {
    /// Query parameter name the torrents endpoint expects
    pub fn query_key(&self) -> &'static str {
        match self {
            ResolvedCode::Code(_) => "code",
            ResolvedCode::Id(_) => "id",
        }
    }

    /// Query parameter value
    pub fn query_value(&self) -> String {
        match self {
            ResolvedCode::Code(code) => code.clone(),
            ResolvedCode::Id(id) => id.to_string(),
        }
    }
}

impl fmt::Display for ResolvedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.query_key(), self.query_value())
    }
}

// =============================================================================
// Result Models
// =============================================================================

/// Release kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorrentKind {
    /// Release covers several episodes (no series number)
    Batch,
}

/// How confident a source is that a result belongs to the queried title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    #[default]
    High,
    Medium,
    Low,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accuracy::High => write!(f, "high"),
            Accuracy::Medium => write!(f, "medium"),
            Accuracy::Low => write!(f, "low"),
        }
    }
}

/// Normalized torrent entry returned by a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentResult {
    pub hash: Option<String>,
    pub link: Option<String>,
    pub title: String,
    pub size: u64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TorrentKind>,
    pub date: DateTime<Utc>,
    pub seeders: u32,
    pub leechers: u32,
    pub downloads: u32,
    pub accuracy: Accuracy,
}

impl TorrentResult {
    /// Magnet URI for an info hash
    pub fn magnet(hash: &str) -> String {
        format!("magnet:?xt=urn:btih:{}", hash)
    }

    /// Whether this entry covers a whole season or more
    pub fn is_batch(&self) -> bool {
        self.kind == Some(TorrentKind::Batch)
    }

    /// Format size for display
    pub fn format_size(&self) -> String {
        match self.size {
            0 => "? GB".to_string(),
            bytes if bytes >= 1024 * 1024 * 1024 => {
                format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
            }
            bytes if bytes >= 1024 * 1024 => {
                format!("{:.0} MB", bytes as f64 / (1024.0 * 1024.0))
            }
            bytes => format!("{} KB", bytes / 1024),
        }
    }
}

impl fmt::Display for TorrentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.title,
            self.format_size(),
            self.date.format("%Y-%m-%d")
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_result() -> TorrentResult {
        TorrentResult {
            hash: Some("abc".to_string()),
            link: Some(TorrentResult::magnet("abc")),
            title: "Frieren - Серия 5 [1080p]".to_string(),
            size: 1000,
            kind: None,
            date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            seeders: 0,
            leechers: 0,
            downloads: 0,
            accuracy: Accuracy::High,
        }
    }

    // -------------------------------------------------------------------------
    // AnimeQuery Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_query_zero_values_count_as_missing() {
        let query = AnimeQuery {
            anilist_id: Some(0),
            titles: vec![],
            episode: Some(0),
        };
        assert_eq!(query.anilist_id(), None);
        assert_eq!(query.episode(), None);
        assert_eq!(query.primary_title(), None);
    }

    #[test]
    fn test_query_builder() {
        let query = AnimeQuery::new(154587, ["Frieren", "Sousou no Frieren"]).with_episode(3);
        assert_eq!(query.anilist_id(), Some(154587));
        assert_eq!(query.episode(), Some(3));
        assert_eq!(query.primary_title(), Some("Frieren"));
        assert_eq!(query.titles.len(), 2);
    }

    // -------------------------------------------------------------------------
    // ResolveStrategy / ResolvedCode Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            ResolveStrategy::from_str_loose("title_search"),
            Some(ResolveStrategy::TitleSearch)
        );
        assert_eq!(
            ResolveStrategy::from_str_loose("ID-Lookup"),
            Some(ResolveStrategy::IdLookup)
        );
        assert_eq!(ResolveStrategy::from_str_loose("magic"), None);
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&ResolveStrategy::IdLookup).unwrap();
        assert_eq!(json, "\"id_lookup\"");

        let parsed: ResolveStrategy = serde_json::from_str("\"title_search\"").unwrap();
        assert_eq!(parsed, ResolveStrategy::TitleSearch);
    }

    #[test]
    fn test_resolved_code_query_parts() {
        let code = ResolvedCode::Code("sousou-no-frieren".to_string());
        assert_eq!(code.query_key(), "code");
        assert_eq!(code.query_value(), "sousou-no-frieren");

        let id = ResolvedCode::Id(9542);
        assert_eq!(id.query_key(), "id");
        assert_eq!(id.to_string(), "id=9542");
    }

    // -------------------------------------------------------------------------
    // TorrentResult Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_result_serializes_type_only_for_batch() {
        let result = sample_result();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("type").is_none());
        assert_eq!(json["accuracy"], "high");
        assert_eq!(json["link"], "magnet:?xt=urn:btih:abc");

        let batch = TorrentResult {
            kind: Some(TorrentKind::Batch),
            ..sample_result()
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["type"], "batch");
        assert!(batch.is_batch());
    }

    #[test]
    fn test_format_size() {
        let mut result = sample_result();
        result.size = 0;
        assert_eq!(result.format_size(), "? GB");
        result.size = 2 * 1024 * 1024 * 1024;
        assert_eq!(result.format_size(), "2.0 GB");
        result.size = 700 * 1024 * 1024;
        assert_eq!(result.format_size(), "700 MB");
        result.size = 4096;
        assert_eq!(result.format_size(), "4 KB");
    }

    #[test]
    fn test_result_display() {
        let display = sample_result().to_string();
        assert!(display.starts_with("Frieren - Серия 5 [1080p]"));
        assert!(display.ends_with("2023-11-14"));
    }
}
