use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;

pub mod gemini;
pub mod prompt;

use crate::config::LanguagePolicy;
use crate::storage::{upload_subtitle, ObjectStore};
use crate::subtitles::SubtitleDescriptor;
use crate::utils::{extract_domain, translated_subtitle_key, validate_and_normalize_url};
use crate::PipelineError;

pub use gemini::GeminiTranslator;

/// Generative model turning a prompt into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Send one prompt and return the generated text
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;

    /// Get the name of the translator
    fn name(&self) -> &'static str;
}

/// Downloads raw subtitle text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}

/// Plain HTTP GET fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

/// Check that a provider link is an http(s) URL and hand it back untouched
///
/// Signed links must be requested byte for byte, so the parsed form is only
/// used for validation.
fn request_url(url: &str) -> Result<&str, PipelineError> {
    validate_and_normalize_url(url).map_err(|e| PipelineError::FetchFailure(e.to_string()))?;
    Ok(url)
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubtitleFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        let url = request_url(url)?;

        tracing::debug!(
            "Fetching subtitle from {}",
            extract_domain(url).unwrap_or_else(|| url.to_string())
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::FetchFailure(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("{}: {}", url, e)))
    }
}

/// Collaborators used by the translate stage
#[derive(Clone, Copy)]
pub struct TranslationServices<'a> {
    pub fetcher: &'a dyn SubtitleFetcher,
    pub translator: &'a dyn Translator,
    pub store: &'a dyn ObjectStore,
    pub policy: &'a LanguagePolicy,
    pub key_prefix: Option<&'a str>,
}

/// One source subtitle on its way to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub index: usize,
    pub source_url: String,
    pub storage_key: String,
}

/// Pick the source-language descriptors and assign each its storage key
pub fn plan_jobs(
    descriptors: &[SubtitleDescriptor],
    video_id: &str,
    policy: &LanguagePolicy,
    key_prefix: Option<&str>,
) -> Vec<TranslationJob> {
    descriptors
        .iter()
        .filter(|descriptor| policy.is_source_id(&descriptor.id))
        .map(|descriptor| descriptor.url.clone())
        .enumerate()
        .map(|(index, source_url)| TranslationJob {
            index,
            source_url,
            storage_key: translated_subtitle_key(key_prefix, video_id, &policy.source, index),
        })
        .collect()
}

/// Fetch, translate and upload one subtitle, returning its presigned URL
pub async fn run_job(
    job: &TranslationJob,
    services: TranslationServices<'_>,
) -> Result<String, PipelineError> {
    let original = services.fetcher.fetch(&job.source_url).await?;

    let prompt = prompt::build_prompt(&original, services.policy);
    let translated = services.translator.generate(&prompt).await?;
    if translated.trim().is_empty() {
        return Err(PipelineError::TranslationFailure(format!(
            "{} returned an empty translation",
            services.translator.name()
        )));
    }

    upload_subtitle(services.store, &job.storage_key, translated).await
}

/// Run every job concurrently, keeping per-job outcomes in job order
pub async fn run_jobs(
    jobs: &[TranslationJob],
    services: TranslationServices<'_>,
) -> Vec<Result<String, PipelineError>> {
    join_all(jobs.iter().map(|job| run_job(job, services))).await
}

/// Translate stage: one translated descriptor per source subtitle that made it to storage
pub async fn translate_subtitles(
    descriptors: &[SubtitleDescriptor],
    video_id: &str,
    services: TranslationServices<'_>,
) -> Vec<SubtitleDescriptor> {
    let jobs = plan_jobs(descriptors, video_id, services.policy, services.key_prefix);
    if jobs.is_empty() {
        tracing::info!("No {} subtitles to translate for {}", services.policy.source, video_id);
        return Vec::new();
    }

    tracing::info!("Translating {} subtitles for {}", jobs.len(), video_id);

    let outcomes = run_jobs(&jobs, services).await;

    outcomes
        .into_iter()
        .zip(&jobs)
        .filter_map(|(outcome, job)| match outcome {
            Ok(url) if !url.is_empty() => Some(url),
            Ok(_) => {
                tracing::warn!("Translation of {} produced no URL", job.source_url);
                None
            }
            Err(e) => {
                tracing::warn!("Skipping translation of {}: {}", job.source_url, e);
                None
            }
        })
        .enumerate()
        .map(|(index, url)| {
            SubtitleDescriptor::new(
                format!("translated-{}", index + 1),
                url,
                services.policy.translated_label.clone(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockObjectStore;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    /// Answers only once every expected download is in flight
    struct RendezvousFetcher {
        barrier: Barrier,
    }

    #[async_trait]
    impl SubtitleFetcher for RendezvousFetcher {
        async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
            self.barrier.wait().await;
            Ok(format!("1\n00:00:01,000 --> 00:00:02,000\n{}\n", url))
        }
    }

    /// Later sources answer first; records completion order
    struct StaggeredFetcher {
        finished: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SubtitleFetcher for StaggeredFetcher {
        async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
            let delay = match url {
                "http://x/1.srt" => 120,
                "http://x/2.srt" => 60,
                _ => 5,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.finished.lock().unwrap().push(url.to_string());
            Ok(format!("subtitle {}", url))
        }
    }

    fn passthrough_translator() -> MockTranslator {
        let mut translator = MockTranslator::new();
        translator.expect_generate().returning(|prompt| Ok(prompt.to_string()));
        translator.expect_name().return_const("mock");
        translator
    }

    fn descriptors() -> Vec<SubtitleDescriptor> {
        vec![
            SubtitleDescriptor::new("en-1", "http://x/1.srt", "English"),
            SubtitleDescriptor::new("en-2", "http://x/2.srt", "English"),
            SubtitleDescriptor::new("es-1", "http://x/3.srt", "Spanish"),
            SubtitleDescriptor::new("en-3", "http://x/4.srt", "English"),
        ]
    }

    fn working_store() -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store.expect_put().returning(|_, _| Ok(()));
        store
            .expect_signed_url()
            .returning(|key| Ok(format!("https://signed/{}", key)));
        store
    }

    fn echo_fetcher() -> MockSubtitleFetcher {
        let mut fetcher = MockSubtitleFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|url| Ok(format!("1\n00:00:01,000 --> 00:00:02,000\n{}\n", url)));
        fetcher
    }

    #[test]
    fn test_plan_selects_source_language_only() {
        let policy = LanguagePolicy::default();
        let jobs = plan_jobs(&descriptors(), "tt0944947:1:2", &policy, None);

        let urls: Vec<&str> = jobs.iter().map(|j| j.source_url.as_str()).collect();
        assert_eq!(urls, vec!["http://x/1.srt", "http://x/2.srt", "http://x/4.srt"]);
        assert_eq!(jobs[0].storage_key, "tt0944947_1_2_translated_en_1.srt");
        assert_eq!(jobs[2].storage_key, "tt0944947_1_2_translated_en_3.srt");
        assert_eq!(jobs[2].index, 2);
    }

    #[test]
    fn test_plan_ignores_translated_and_other_ids() {
        let policy = LanguagePolicy::default();
        let descriptors = vec![
            SubtitleDescriptor::new("translated-1", "http://x/t.srt", "Español (Traducido)"),
            SubtitleDescriptor::new("es-1", "http://x/es.srt", "Spanish"),
        ];
        assert!(plan_jobs(&descriptors, "tt1", &policy, Some("p/")).is_empty());
    }

    #[tokio::test]
    async fn test_translate_all_succeed() {
        let fetcher = echo_fetcher();
        let mut translator = MockTranslator::new();
        translator
            .expect_generate()
            .times(3)
            .returning(|prompt| Ok(prompt.replace("http://x/", "traducido/")));
        translator.expect_name().return_const("mock");
        let store = working_store();
        let policy = LanguagePolicy::default();
        let services = TranslationServices {
            fetcher: &fetcher,
            translator: &translator,
            store: &store,
            policy: &policy,
            key_prefix: Some("subs/"),
        };

        let translated = translate_subtitles(&descriptors(), "tt1", services).await;

        assert_eq!(
            translated,
            vec![
                SubtitleDescriptor::new("translated-1", "https://signed/subs/tt1_translated_en_1.srt", "Español (Traducido)"),
                SubtitleDescriptor::new("translated-2", "https://signed/subs/tt1_translated_en_2.srt", "Español (Traducido)"),
                SubtitleDescriptor::new("translated-3", "https://signed/subs/tt1_translated_en_3.srt", "Español (Traducido)"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_jobs_are_skipped_in_order() {
        let mut fetcher = MockSubtitleFetcher::new();
        fetcher.expect_fetch().returning(|url| {
            if url.ends_with("/2.srt") {
                Err(PipelineError::FetchFailure("HTTP 404".to_string()))
            } else {
                Ok(format!("subtitle {}", url))
            }
        });
        let mut translator = MockTranslator::new();
        translator.expect_generate().returning(|prompt| Ok(prompt.to_string()));
        translator.expect_name().return_const("mock");
        let store = working_store();
        let policy = LanguagePolicy::default();
        let services = TranslationServices {
            fetcher: &fetcher,
            translator: &translator,
            store: &store,
            policy: &policy,
            key_prefix: None,
        };

        let translated = translate_subtitles(&descriptors(), "tt1", services).await;

        // survivors keep their storage key index but are renumbered
        assert_eq!(translated.len(), 2);
        assert_eq!(translated[0].id, "translated-1");
        assert_eq!(translated[0].url, "https://signed/tt1_translated_en_1.srt");
        assert_eq!(translated[1].id, "translated-2");
        assert_eq!(translated[1].url, "https://signed/tt1_translated_en_3.srt");
    }

    #[tokio::test]
    async fn test_job_failure_kinds() {
        let fetcher = echo_fetcher();
        let mut translator = MockTranslator::new();
        translator.expect_generate().returning(|prompt| {
            if prompt.contains("http://x/1.srt") {
                Err(PipelineError::TranslationFailure("quota".to_string()))
            } else if prompt.contains("http://x/2.srt") {
                Ok("   ".to_string())
            } else {
                Ok("1\nHola".to_string())
            }
        });
        translator.expect_name().return_const("mock");
        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .returning(|_, _| Err(PipelineError::StorageFailure("denied".to_string())));
        let policy = LanguagePolicy::default();
        let services = TranslationServices {
            fetcher: &fetcher,
            translator: &translator,
            store: &store,
            policy: &policy,
            key_prefix: None,
        };

        let jobs = plan_jobs(&descriptors(), "tt1", &policy, None);
        let outcomes = run_jobs(&jobs, services).await;

        assert!(matches!(outcomes[0], Err(PipelineError::TranslationFailure(_))));
        assert!(matches!(outcomes[1], Err(PipelineError::TranslationFailure(_))));
        assert!(matches!(outcomes[2], Err(PipelineError::StorageFailure(_))));
        assert!(translate_subtitles(&descriptors(), "tt1", services).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_sources_makes_no_calls() {
        let mut fetcher = MockSubtitleFetcher::new();
        fetcher.expect_fetch().never();
        let mut translator = MockTranslator::new();
        translator.expect_generate().never();
        let mut store = MockObjectStore::new();
        store.expect_put().never();
        let policy = LanguagePolicy::default();
        let services = TranslationServices {
            fetcher: &fetcher,
            translator: &translator,
            store: &store,
            policy: &policy,
            key_prefix: None,
        };

        assert!(translate_subtitles(&[], "tt1", services).await.is_empty());

        let spanish_only = vec![SubtitleDescriptor::new("es-1", "http://x/es.srt", "Spanish")];
        assert!(translate_subtitles(&spanish_only, "tt1", services).await.is_empty());
    }

    #[tokio::test]
    async fn test_jobs_are_in_flight_together() {
        let policy = LanguagePolicy::default();
        let sources = plan_jobs(&descriptors(), "tt1", &policy, None).len();
        let fetcher = RendezvousFetcher {
            barrier: Barrier::new(sources),
        };
        let translator = passthrough_translator();
        let store = working_store();
        let services = TranslationServices {
            fetcher: &fetcher,
            translator: &translator,
            store: &store,
            policy: &policy,
            key_prefix: None,
        };

        let translated = tokio::time::timeout(
            Duration::from_secs(5),
            translate_subtitles(&descriptors(), "tt1", services),
        )
        .await
        .expect("downloads were not started together");

        assert_eq!(translated.len(), sources);
    }

    #[tokio::test]
    async fn test_results_follow_input_order_not_completion_order() {
        let fetcher = StaggeredFetcher {
            finished: Mutex::new(Vec::new()),
        };
        let translator = passthrough_translator();
        let store = working_store();
        let policy = LanguagePolicy::default();
        let services = TranslationServices {
            fetcher: &fetcher,
            translator: &translator,
            store: &store,
            policy: &policy,
            key_prefix: None,
        };

        let translated = translate_subtitles(&descriptors(), "tt1", services).await;

        assert_eq!(
            *fetcher.finished.lock().unwrap(),
            vec!["http://x/4.srt", "http://x/2.srt", "http://x/1.srt"]
        );
        let urls: Vec<&str> = translated.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://signed/tt1_translated_en_1.srt",
                "https://signed/tt1_translated_en_2.srt",
                "https://signed/tt1_translated_en_3.srt",
            ]
        );
        assert_eq!(translated[0].id, "translated-1");
        assert_eq!(translated[2].id, "translated-3");
    }

    #[test]
    fn test_request_url_is_sent_as_given() {
        let signed = "http://DL.Example.com/sub/../file.srt?sig=a b&exp=1%2F2";
        assert_eq!(request_url(signed).unwrap(), signed);
        assert_ne!(validate_and_normalize_url(signed).unwrap(), signed);

        assert!(matches!(
            request_url("ftp://example.com/a.srt"),
            Err(PipelineError::FetchFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_non_http_urls() {
        let fetcher = HttpFetcher::new();
        let result = fetcher.fetch("ftp://example.com/a.srt").await;
        assert!(matches!(result, Err(PipelineError::FetchFailure(_))));
    }
}
