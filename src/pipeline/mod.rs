use std::sync::Arc;

use crate::config::{Config, LanguagePolicy};
use crate::search::{search_subtitles, OpenSubtitlesClient, SearchQuery, SubtitleSearch};
use crate::storage::{ObjectStore, S3Store};
use crate::subtitles::{format_subtitles, SubtitleDescriptor};
use crate::translate::{
    translate_subtitles, GeminiTranslator, HttpFetcher, SubtitleFetcher, TranslationServices,
    Translator,
};

/// Search, format, translate and aggregate subtitles for one media item
pub struct SubtitlePipeline {
    search: Arc<dyn SubtitleSearch>,
    fetcher: Arc<dyn SubtitleFetcher>,
    translator: Arc<dyn Translator>,
    store: Arc<dyn ObjectStore>,
    policy: LanguagePolicy,
    key_prefix: Option<String>,
}

impl SubtitlePipeline {
    /// Assemble a pipeline from explicit services
    pub fn new(
        search: Arc<dyn SubtitleSearch>,
        fetcher: Arc<dyn SubtitleFetcher>,
        translator: Arc<dyn Translator>,
        store: Arc<dyn ObjectStore>,
        policy: LanguagePolicy,
    ) -> Self {
        Self {
            search,
            fetcher,
            translator,
            store,
            policy,
            key_prefix: None,
        }
    }

    /// Prefix every translated object key
    pub fn with_key_prefix(mut self, prefix: Option<String>) -> Self {
        self.key_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    /// Create the production pipeline (OpenSubtitles, Gemini, S3)
    pub async fn from_config(config: &Config) -> Self {
        let store = S3Store::from_config(config).await;

        Self::new(
            Arc::new(OpenSubtitlesClient::new(&config.opensubtitles)),
            Arc::new(HttpFetcher::new()),
            Arc::new(GeminiTranslator::new(&config.gemini)),
            Arc::new(store),
            config.languages.clone(),
        )
        .with_key_prefix(config.aws.s3_key_prefix.clone())
    }

    /// Original subtitles followed by their translations; never fails
    pub async fn generate_subtitles(&self, query: &SearchQuery) -> Vec<SubtitleDescriptor> {
        let raw = search_subtitles(self.search.as_ref(), query).await;
        let formatted = format_subtitles(raw.as_ref(), &self.policy);

        let services = TranslationServices {
            fetcher: self.fetcher.as_ref(),
            translator: self.translator.as_ref(),
            store: self.store.as_ref(),
            policy: &self.policy,
            key_prefix: self.key_prefix.as_deref(),
        };
        let translated = translate_subtitles(&formatted, &query.video_id, services).await;

        let mut subtitles = formatted;
        subtitles.extend(translated);

        tracing::info!("Found {} subtitles", subtitles.len());
        subtitles
    }
}
