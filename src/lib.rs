//! Subtrans - subtitles for a media item, with machine-translated Spanish tracks
//!
//! This library searches OpenSubtitles for a media item, keeps the English and
//! Spanish tracks, translates every English track with Google Gemini, stores the
//! translations in S3 and hands back one list of subtitle descriptors.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod search;
pub mod storage;
pub mod subtitles;
pub mod translate;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::{Config, LanguagePolicy};
pub use pipeline::SubtitlePipeline;
pub use search::{RawSubtitleFile, RawSubtitleResult, SearchQuery, SubtitleSearch};
pub use storage::ObjectStore;
pub use subtitles::SubtitleDescriptor;
pub use translate::{SubtitleFetcher, Translator};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failure kinds of the individual pipeline stages.
///
/// Stages return these internally and collapse them to an empty or missing
/// value at their public boundary.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Subtitle provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Subtitle provider returned no results")]
    ProviderEmpty,

    #[error("Failed to fetch subtitle content: {0}")]
    FetchFailure(String),

    #[error("Translation failed: {0}")]
    TranslationFailure(String),

    #[error("Storage operation failed: {0}")]
    StorageFailure(String),
}
