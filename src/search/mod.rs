use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod opensubtitles;

use crate::utils::parse_video_id;
use crate::PipelineError;

pub use opensubtitles::OpenSubtitlesClient;

pub const DEFAULT_EXTENSIONS: &[&str] = &["srt"];
pub const DEFAULT_LIMIT: usize = 10;

/// Provider results grouped by language code, each group in provider order
pub type RawSubtitleResult = BTreeMap<String, Vec<RawSubtitleFile>>;

/// One downloadable subtitle file as reported by the search provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSubtitleFile {
    /// Provider file id
    pub id: String,

    /// Download link in the file's original encoding
    pub url: String,

    /// Download link re-encoded to UTF-8
    pub utf8: String,

    /// Language label reported by the provider
    pub lang: String,

    /// ISO 639-1 language code
    pub lang_code: String,

    /// File format (srt, sub, ...)
    pub format: String,

    /// Original file name
    pub filename: String,
}

/// Everything needed to search subtitles for one media item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Media identifier as received from the caller (`tt0944947:1:2`)
    pub video_id: String,

    /// IMDb id without season/episode suffix
    pub imdb_id: String,

    /// File formats to keep
    pub extensions: Vec<String>,

    /// Maximum results per language
    pub limit: usize,

    /// Extra provider filters (season, episode, sublanguageid, query, ...)
    pub filters: BTreeMap<String, String>,
}

impl SearchQuery {
    /// Query with the stock defaults (`srt`, 10 per language)
    pub fn new(video_id: &str) -> Self {
        let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        Self::with_defaults(video_id, &extensions, DEFAULT_LIMIT)
    }

    /// Query with configured defaults; filters applied afterwards override them
    pub fn with_defaults(video_id: &str, extensions: &[String], limit: usize) -> Self {
        let (imdb_id, season, episode) = parse_video_id(video_id);

        let mut query = Self {
            video_id: video_id.trim().to_string(),
            imdb_id,
            extensions: extensions.to_vec(),
            limit,
            filters: BTreeMap::new(),
        };

        if let Some(season) = season {
            query = query.filter("season", &season.to_string());
        }
        if let Some(episode) = episode {
            query = query.filter("episode", &episode.to_string());
        }

        query
    }

    /// Merge one caller-supplied filter, replacing any default for the same key
    pub fn filter(mut self, key: &str, value: &str) -> Self {
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "extensions" => {
                self.extensions = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                    .filter(|ext| !ext.is_empty())
                    .collect();
            }
            "limit" => match value.parse::<usize>() {
                Ok(limit) if limit > 0 => self.limit = limit,
                _ => tracing::warn!("Ignoring invalid limit filter: {}", value),
            },
            "imdbid" => self.imdb_id = value.to_string(),
            _ => {
                self.filters.insert(key, value.to_string());
            }
        }

        self
    }

    /// Whether a file format passes the extension filter
    pub fn accepts_format(&self, format: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(format))
    }
}

/// A subtitle search backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleSearch: Send + Sync {
    /// Run one search against the provider
    async fn search(&self, query: &SearchQuery) -> Result<RawSubtitleResult, PipelineError>;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Search that reports why nothing came back
pub async fn try_search_subtitles(
    provider: &dyn SubtitleSearch,
    query: &SearchQuery,
) -> Result<RawSubtitleResult, PipelineError> {
    tracing::info!(
        "Searching {} for subtitles of {}",
        provider.provider_name(),
        query.video_id
    );

    let result = provider.search(query).await?;

    if result.values().all(|files| files.is_empty()) {
        return Err(PipelineError::ProviderEmpty);
    }

    Ok(result)
}

/// Search stage: provider failures and empty results both become `None`
pub async fn search_subtitles(
    provider: &dyn SubtitleSearch,
    query: &SearchQuery,
) -> Option<RawSubtitleResult> {
    match try_search_subtitles(provider, query).await {
        Ok(result) => Some(result),
        Err(PipelineError::ProviderEmpty) => {
            tracing::info!("No subtitles found for {}", query.video_id);
            None
        }
        Err(e) => {
            tracing::error!("Subtitle search failed for {}: {}", query.video_id, e);
            None
        }
    }
}
