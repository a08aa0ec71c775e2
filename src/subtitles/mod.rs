use serde::{Deserialize, Serialize};

use crate::config::LanguagePolicy;
use crate::search::RawSubtitleResult;

/// Subtitle entry handed back to the addon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleDescriptor {
    /// Unique within one response (`en-1`, `translated-2`, ...)
    pub id: String,

    /// Where the subtitle file can be downloaded
    pub url: String,

    /// Language label shown to the user
    pub lang: String,
}

impl SubtitleDescriptor {
    pub fn new(id: impl Into<String>, url: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            lang: lang.into(),
        }
    }
}

/// Flatten the per-language search result into descriptors
///
/// Languages come out in allow-list order, files in provider order, numbered from 1.
pub fn format_subtitles(
    raw: Option<&RawSubtitleResult>,
    policy: &LanguagePolicy,
) -> Vec<SubtitleDescriptor> {
    let Some(raw) = raw else {
        tracing::info!("No subtitles to format");
        return Vec::new();
    };

    policy
        .allowed
        .iter()
        .filter_map(|lang_code| raw.get(lang_code).map(|files| (lang_code, files)))
        .flat_map(|(lang_code, files)| {
            files
                .iter()
                .filter(|file| !file.utf8.is_empty())
                .enumerate()
                .map(move |(index, file)| {
                    SubtitleDescriptor::new(
                        format!("{}-{}", lang_code, index + 1),
                        file.utf8.clone(),
                        file.lang.clone(),
                    )
                })
        })
        .collect()
}
