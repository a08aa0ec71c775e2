use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{RawSubtitleFile, RawSubtitleResult, SearchQuery, SubtitleSearch};
use crate::config::OpenSubtitlesConfig;
use crate::utils::imdb_numeric_id;
use crate::PipelineError;

/// One record of the OpenSubtitles REST search response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRecord {
    #[serde(rename = "IDSubtitleFile", default)]
    pub id_subtitle_file: String,
    #[serde(rename = "SubFileName", default)]
    pub sub_file_name: String,
    #[serde(rename = "SubFormat", default)]
    pub sub_format: String,
    #[serde(rename = "SubDownloadLink", default)]
    pub sub_download_link: String,
    #[serde(rename = "ISO639", default)]
    pub iso639: String,
    #[serde(rename = "LanguageName", default)]
    pub language_name: String,
}

/// OpenSubtitles REST search client
pub struct OpenSubtitlesClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl OpenSubtitlesClient {
    pub fn new(config: &OpenSubtitlesConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Build the search URL; the API expects `key-value` path segments sorted by key
    pub fn search_url(&self, query: &SearchQuery) -> String {
        let mut segments = query.filters.clone();
        segments.insert("imdbid".to_string(), imdb_numeric_id(&query.imdb_id));

        let path = segments
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}-{}",
                    urlencoding::encode(key),
                    urlencoding::encode(&value.to_lowercase())
                )
            })
            .collect::<Vec<_>>()
            .join("/");

        format!("{}/search/{}", self.base_url, path)
    }
}

/// Download link re-encoded to UTF-8 and served uncompressed
pub fn utf8_link(download_link: &str, format: &str) -> String {
    plain_link(download_link, format).replacen("download/", "download/subencoding-utf8/", 1)
}

/// Download link served uncompressed in the original encoding
pub fn plain_link(download_link: &str, format: &str) -> String {
    match download_link.strip_suffix(".gz") {
        Some(stem) if !format.is_empty() => format!("{}.{}", stem, format),
        _ => download_link.to_string(),
    }
}

/// Group records by language, applying the extension filter and per-language limit
pub fn group_records(records: Vec<SearchRecord>, query: &SearchQuery) -> RawSubtitleResult {
    let mut result = RawSubtitleResult::new();

    for record in records {
        if record.iso639.is_empty() || record.sub_download_link.is_empty() {
            continue;
        }
        if !query.accepts_format(&record.sub_format) {
            continue;
        }

        let files = result.entry(record.iso639.clone()).or_default();
        if files.len() >= query.limit {
            continue;
        }

        files.push(RawSubtitleFile {
            id: record.id_subtitle_file,
            url: plain_link(&record.sub_download_link, &record.sub_format),
            utf8: utf8_link(&record.sub_download_link, &record.sub_format),
            lang: record.language_name,
            lang_code: record.iso639,
            format: record.sub_format,
            filename: record.sub_file_name,
        });
    }

    result.retain(|_, files| !files.is_empty());
    result
}

#[async_trait]
impl SubtitleSearch for OpenSubtitlesClient {
    async fn search(&self, query: &SearchQuery) -> Result<RawSubtitleResult, PipelineError> {
        let url = self.search_url(query);
        tracing::debug!("OpenSubtitles search: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| PipelineError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::ProviderUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let records: Vec<SearchRecord> = response
            .json()
            .await
            .map_err(|e| PipelineError::ProviderUnavailable(format!("Invalid search response: {}", e)))?;

        tracing::debug!("OpenSubtitles returned {} records", records.len());

        Ok(group_records(records, query))
    }

    fn provider_name(&self) -> &'static str {
        "OpenSubtitles"
    }
}
