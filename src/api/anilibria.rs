//! AniLibria source
//!
//! Resolves an AniList id to an AniLibria title, then lists that title's
//! torrents as magnet links. Network and decoding failures are logged and
//! reported as "nothing found"; only malformed queries surface as errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::{Capability, SourceError, TorrentSource};
use crate::config::Config;
use crate::models::{
    Accuracy, AnimeQuery, ResolveStrategy, ResolvedCode, TorrentKind, TorrentResult,
};

const CAPABILITIES: &[Capability] = &[
    Capability::Single,
    Capability::Batch,
    Capability::Movie,
    Capability::Validate,
];

/// Placeholder values for the health check
const HEALTH_SEARCH: &str = "test";
const HEALTH_ID: u32 = 1;

/// Id lookup response
#[derive(Debug, Deserialize)]
struct LookupResponse {
    id: Option<u64>,
}

/// Torrent listing response; entries are decoded one by one
#[derive(Debug, Deserialize)]
struct TorrentListResponse {
    torrents: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct TorrentQuality {
    #[serde(default, deserialize_with = "lenient")]
    string: Option<String>,
}

/// Individual torrent from AniLibria
///
/// Every field tolerates a wrong type so one odd entry never hides the rest.
#[derive(Debug, Default, Deserialize)]
struct AniLibriaTorrent {
    #[serde(default, deserialize_with = "lenient")]
    hash: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    quality: Option<TorrentQuality>,
    /// Number, label string, or `{ "string": "1-12" }` depending on API version
    series: Option<Value>,
    size: Option<Value>,
    uploaded_timestamp: Option<Value>,
}

/// Decode a field, treating a mismatched type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl AniLibriaTorrent {
    /// Decode a raw listing entry; non-objects become an empty entry
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Convert API response to our TorrentResult model
    fn into_torrent_result(self, primary_title: Option<&str>) -> TorrentResult {
        let series = self.series.as_ref().and_then(series_label);
        let quality = self.quality.and_then(|q| q.string);
        let hash = self.hash.filter(|h| !h.is_empty());

        TorrentResult {
            link: hash.as_deref().map(TorrentResult::magnet),
            hash,
            title: compose_title(primary_title, series.as_deref(), quality.as_deref()),
            size: self.size.as_ref().map(whole_number).unwrap_or(0),
            kind: if series.is_some() {
                None
            } else {
                Some(TorrentKind::Batch)
            },
            date: self
                .uploaded_timestamp
                .as_ref()
                .map(whole_number)
                .filter(|ts| *ts != 0)
                .and_then(|ts| DateTime::from_timestamp(ts as i64, 0))
                .unwrap_or_else(Utc::now),
            seeders: 0,
            leechers: 0,
            downloads: 0,
            accuracy: Accuracy::High,
        }
    }
}

/// Non-negative integer from a JSON number or numeric string, 0 otherwise
fn whole_number(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |f| f.max(0.0) as u64),
        _ => 0,
    }
}

/// Episode label for a torrent; zero, empty and null mean "no series"
fn series_label(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("string").and_then(series_label),
        _ => None,
    }
}

/// "{title} {- Серия series} [{quality}]"; the series slot stays empty for batches
fn compose_title(primary: Option<&str>, series: Option<&str>, quality: Option<&str>) -> String {
    let primary = primary.filter(|t| !t.is_empty()).unwrap_or("Anime");
    let series = series
        .map(|s| format!("- Серия {}", s))
        .unwrap_or_default();
    let quality = quality.filter(|q| !q.is_empty()).unwrap_or("Unknown");
    format!("{} {} [{}]", primary, series, quality)
}

/// Code from `{ "code": .. }` or `[{ "code": .. }, ..]`, empty codes ignored
fn search_code_from(data: &Value) -> Option<String> {
    data.get("code")
        .or_else(|| data.as_array()?.first()?.get("code"))
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// AniLibria torrent source
#[derive(Debug, Clone)]
pub struct AniLibriaSource {
    api_url: String,
    torrent_url: String,
    strategy: ResolveStrategy,
    client: reqwest::Client,
}

impl AniLibriaSource {
    /// Create a source with the default endpoints and title search
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a source from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.api_url.clone(),
            torrent_url: config.torrent_url.clone(),
            strategy: config.strategy,
            client: build_client(Duration::from_secs(config.timeout_secs)),
        }
    }

    /// Create a source with custom endpoints (for testing)
    pub fn with_urls(api_url: impl Into<String>, torrent_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            torrent_url: torrent_url.into(),
            ..Self::new()
        }
    }

    pub fn with_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Resolve an AniList id into AniLibria's identifier for the title.
    ///
    /// Title search needs at least one title and uses the first one. Returns
    /// `None` on a miss, a non-success status, or any transport/parse failure.
    pub async fn resolve_code(&self, anilist_id: u32, titles: &[String]) -> Option<ResolvedCode> {
        let result = match self.strategy {
            ResolveStrategy::TitleSearch => match titles.first() {
                Some(title) => self.search_code(title).await,
                None => return None,
            },
            ResolveStrategy::IdLookup => self.lookup_id(anilist_id).await,
        };

        match result {
            Ok(Some(code)) => {
                info!(anilist_id, %code, "resolved AniLibria title");
                Some(code)
            }
            Ok(None) => {
                debug!(anilist_id, "no AniLibria title matched");
                None
            }
            Err(e) => {
                debug!(anilist_id, error = %e, "AniLibria resolve failed");
                None
            }
        }
    }

    /// List torrents for a resolved title, optionally for one episode.
    ///
    /// No request is made without a resolved code. Failures yield an empty list.
    pub async fn fetch_torrents(
        &self,
        resolved: Option<&ResolvedCode>,
        episode: Option<u32>,
        titles: &[String],
    ) -> Vec<TorrentResult> {
        let Some(resolved) = resolved else {
            return Vec::new();
        };

        let primary_title = titles.first().map(String::as_str);
        match self.try_fetch_torrents(resolved, episode, primary_title).await {
            Ok(results) => {
                info!(%resolved, count = results.len(), "fetched AniLibria torrents");
                results
            }
            Err(e) => {
                debug!(%resolved, error = %e, "AniLibria torrent fetch failed");
                Vec::new()
            }
        }
    }

    async fn search_code(&self, title: &str) -> Result<Option<ResolvedCode>, SourceError> {
        let url = format!("{}?search={}", self.api_url, urlencoding::encode(title));
        let data: Value = self.get_json(&url).await?;

        Ok(search_code_from(&data).map(ResolvedCode::Code))
    }

    async fn lookup_id(&self, anilist_id: u32) -> Result<Option<ResolvedCode>, SourceError> {
        let url = format!("{}?id={}", self.api_url, anilist_id);
        let data: LookupResponse = self.get_json(&url).await?;

        Ok(data.id.filter(|id| *id > 0).map(ResolvedCode::Id))
    }

    async fn try_fetch_torrents(
        &self,
        resolved: &ResolvedCode,
        episode: Option<u32>,
        primary_title: Option<&str>,
    ) -> Result<Vec<TorrentResult>, SourceError> {
        let mut url = format!(
            "{}?{}={}",
            self.torrent_url,
            resolved.query_key(),
            urlencoding::encode(&resolved.query_value())
        );
        if let Some(episode) = episode.filter(|ep| *ep > 0) {
            url.push_str(&format!("&episode={}", episode));
        }

        let data: TorrentListResponse = self.get_json(&url).await?;

        Ok(data
            .torrents
            .unwrap_or_default()
            .into_iter()
            .map(|t| AniLibriaTorrent::from_value(t).into_torrent_result(primary_title))
            .collect())
    }

    /// GET a URL and decode its JSON body, failing on non-success status
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| SourceError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// Shared resolve-then-fetch flow behind single/batch/movie
    async fn search(
        &self,
        query: &AnimeQuery,
        episode: Option<u32>,
    ) -> Result<Vec<TorrentResult>, SourceError> {
        let anilist_id = query.anilist_id().ok_or(SourceError::MissingAnilistId)?;
        if query.titles.is_empty() {
            return Err(SourceError::MissingTitles);
        }

        let Some(code) = self.resolve_code(anilist_id, &query.titles).await else {
            return Ok(Vec::new());
        };

        Ok(self.fetch_torrents(Some(&code), episode, &query.titles).await)
    }
}

impl Default for AniLibriaSource {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[async_trait]
impl TorrentSource for AniLibriaSource {
    fn name(&self) -> &str {
        "AniLibria"
    }

    fn capabilities(&self) -> &[Capability] {
        CAPABILITIES
    }

    async fn single(&self, query: &AnimeQuery) -> Result<Vec<TorrentResult>, SourceError> {
        self.search(query, query.episode()).await
    }

    async fn batch(&self, query: &AnimeQuery) -> Result<Vec<TorrentResult>, SourceError> {
        self.search(query, None).await
    }

    async fn movie(&self, query: &AnimeQuery) -> Result<Vec<TorrentResult>, SourceError> {
        self.search(query, None).await
    }

    async fn validate(&self) -> bool {
        let url = match self.strategy {
            ResolveStrategy::TitleSearch => format!("{}?search={}", self.api_url, HEALTH_SEARCH),
            ResolveStrategy::IdLookup => format!("{}?id={}", self.api_url, HEALTH_ID),
        };

        match self.client.get(&url).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                if !ok {
                    debug!(status = response.status().as_u16(), "AniLibria health check rejected");
                }
                ok
            }
            Err(e) => {
                debug!(error = %e, "AniLibria health check failed");
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn torrent(value: Value) -> AniLibriaTorrent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_compose_title() {
        assert_eq!(
            compose_title(Some("Frieren"), Some("5"), Some("1080p")),
            "Frieren - Серия 5 [1080p]"
        );
        assert_eq!(
            compose_title(Some("Frieren"), None, Some("1080p")),
            "Frieren  [1080p]"
        );
        assert_eq!(compose_title(None, None, None), "Anime  [Unknown]");
        assert_eq!(compose_title(Some(""), None, Some("")), "Anime  [Unknown]");
    }

    #[test]
    fn test_series_label() {
        assert_eq!(series_label(&json!(5)), Some("5".to_string()));
        assert_eq!(series_label(&json!("1-12")), Some("1-12".to_string()));
        assert_eq!(
            series_label(&json!({"first": 1, "last": 12, "string": "1-12"})),
            Some("1-12".to_string())
        );
        assert_eq!(series_label(&json!(0)), None);
        assert_eq!(series_label(&json!("")), None);
        assert_eq!(series_label(&Value::Null), None);
    }

    #[test]
    fn test_maps_episode_torrent() {
        let result = torrent(json!({
            "hash": "abc",
            "quality": {"string": "1080p"},
            "series": 5,
            "size": 1000,
            "uploaded_timestamp": 1700000000
        }))
        .into_torrent_result(Some("Frieren"));

        assert_eq!(result.hash.as_deref(), Some("abc"));
        assert_eq!(result.link.as_deref(), Some("magnet:?xt=urn:btih:abc"));
        assert_eq!(result.title, "Frieren - Серия 5 [1080p]");
        assert_eq!(result.size, 1000);
        assert_eq!(result.kind, None);
        assert_eq!(result.date.timestamp(), 1_700_000_000);
        assert_eq!(result.accuracy, Accuracy::High);
        assert_eq!((result.seeders, result.leechers, result.downloads), (0, 0, 0));
    }

    #[test]
    fn test_maps_sparse_torrent() {
        let before = Utc::now();
        let result = torrent(json!({})).into_torrent_result(None);
        let after = Utc::now();

        assert_eq!(result.hash, None);
        assert_eq!(result.link, None);
        assert_eq!(result.title, "Anime  [Unknown]");
        assert_eq!(result.size, 0);
        assert_eq!(result.kind, Some(TorrentKind::Batch));
        assert!(result.date >= before && result.date <= after);
    }

    #[test]
    fn test_maps_mistyped_fields() {
        let result = AniLibriaTorrent::from_value(json!({
            "hash": "odd",
            "quality": "1080p",
            "size": 1.5e9,
            "uploaded_timestamp": "1700000000"
        }))
        .into_torrent_result(Some("Frieren"));

        assert_eq!(result.hash.as_deref(), Some("odd"));
        assert_eq!(result.title, "Frieren  [Unknown]");
        assert_eq!(result.size, 1_500_000_000);
        assert_eq!(result.date.timestamp(), 1_700_000_000);

        let wrong_types = AniLibriaTorrent::from_value(json!({
            "hash": 42,
            "quality": {"string": 1080},
            "size": "big",
            "uploaded_timestamp": -5
        }))
        .into_torrent_result(None);

        assert_eq!(wrong_types.hash, None);
        assert_eq!(wrong_types.title, "Anime  [Unknown]");
        assert_eq!(wrong_types.size, 0);
    }

    #[test]
    fn test_non_object_entry_is_empty_torrent() {
        let result = AniLibriaTorrent::from_value(json!("abc")).into_torrent_result(None);
        assert_eq!(result.hash, None);
        assert_eq!(result.kind, Some(TorrentKind::Batch));
    }

    #[test]
    fn test_search_code_from() {
        assert_eq!(
            search_code_from(&json!({"code": "frieren"})),
            Some("frieren".to_string())
        );
        assert_eq!(
            search_code_from(&json!([{"code": "first"}, {"code": "second"}])),
            Some("first".to_string())
        );
        assert_eq!(search_code_from(&json!(["abc"])), None);
        assert_eq!(search_code_from(&json!([])), None);
        assert_eq!(search_code_from(&json!({"code": ""})), None);
        assert_eq!(search_code_from(&json!({"code": 7})), None);
        assert_eq!(search_code_from(&Value::Null), None);
    }

    #[test]
    fn test_capabilities_and_name() {
        let source = AniLibriaSource::new();
        assert_eq!(source.name(), "AniLibria");
        assert_eq!(source.capabilities().len(), 4);
        assert!(source.capabilities().contains(&Capability::Validate));
        assert_eq!(source.strategy(), ResolveStrategy::TitleSearch);
    }
}
