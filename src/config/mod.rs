use anyhow::{Context, Result};
use aws_config::Region;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest expiry S3 accepts for a SigV4 presigned URL (7 days)
const MAX_URL_EXPIRY_SECS: u64 = 7 * 24 * 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// AWS configuration
    pub aws: AwsConfig,

    /// Gemini translation settings
    pub gemini: GeminiConfig,

    /// OpenSubtitles search settings
    pub opensubtitles: OpenSubtitlesConfig,

    /// Which languages are returned and which get translated
    pub languages: LanguagePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region
    pub region: String,

    /// S3 bucket holding translated subtitles
    pub s3_bucket: String,

    /// Optional S3 key prefix
    pub s3_key_prefix: Option<String>,

    /// Lifetime of the presigned download URLs
    pub url_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    pub api_key: String,

    /// Model used for generateContent calls
    pub model: String,

    /// API base URL
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSubtitlesConfig {
    /// REST API base URL
    pub base_url: String,

    /// User agent registered with OpenSubtitles
    pub user_agent: String,

    /// Subtitle file formats to keep
    pub extensions: Vec<String>,

    /// Maximum results per language
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePolicy {
    /// Language codes kept from the search results, in output order
    pub allowed: Vec<String>,

    /// Language code whose subtitles are translated
    pub source: String,

    /// Human-readable source language, used in the prompt
    pub source_name: String,

    /// Human-readable target language, used in the prompt
    pub target_name: String,

    /// `lang` label attached to translated subtitles
    pub translated_label: String,
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        Self {
            allowed: vec!["en".to_string(), "es".to_string()],
            source: "en".to_string(),
            source_name: "English".to_string(),
            target_name: "neutral Latin American Spanish".to_string(),
            translated_label: "Español (Traducido)".to_string(),
        }
    }
}

impl LanguagePolicy {
    /// Whether a descriptor id (`{lang}-{n}`) belongs to the source language
    pub fn is_source_id(&self, id: &str) -> bool {
        id.split_once('-')
            .map(|(lang, _)| lang == self.source)
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsConfig {
                region: "us-east-1".to_string(),
                s3_bucket: "".to_string(),
                s3_key_prefix: None,
                url_expiry_secs: 3600,
            },
            gemini: GeminiConfig {
                api_key: "".to_string(),
                model: "gemini-1.5-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            },
            opensubtitles: OpenSubtitlesConfig {
                base_url: "https://rest.opensubtitles.org".to_string(),
                user_agent: "TemporaryUserAgent".to_string(),
                extensions: vec!["srt".to_string()],
                limit: 10,
            },
            languages: LanguagePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default, then apply environment overrides
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let config = Self::default();
            config.save().await?;
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file without validating it
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        serde_yaml::from_str(&content)
            .context("Failed to parse config file")
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("subtrans").join("config.yaml"))
    }

    /// Overlay values taken from the environment (secrets usually live there)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(region) = lookup("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(bucket) = lookup("AWS_BUCKET_NAME") {
            self.aws.s3_bucket = bucket;
        }
        if let Some(api_key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = api_key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(user_agent) = lookup("OPENSUBTITLES_USER_AGENT") {
            self.opensubtitles.user_agent = user_agent;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.aws.s3_bucket.is_empty() {
            anyhow::bail!("AWS S3 bucket must be configured (aws.s3_bucket or AWS_BUCKET_NAME)");
        }

        if self.gemini.api_key.is_empty() {
            anyhow::bail!("Gemini API key must be configured (gemini.api_key or GEMINI_API_KEY)");
        }

        if !(1..=MAX_URL_EXPIRY_SECS).contains(&self.aws.url_expiry_secs) {
            anyhow::bail!(
                "aws.url_expiry_secs must be between 1 and {} seconds",
                MAX_URL_EXPIRY_SECS
            );
        }

        if self.opensubtitles.limit == 0 {
            anyhow::bail!("opensubtitles.limit must be greater than zero");
        }

        if !self.languages.allowed.contains(&self.languages.source) {
            anyhow::bail!(
                "Source language '{}' is not in the allowed languages {:?}",
                self.languages.source,
                self.languages.allowed
            );
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  AWS Region: {}", self.aws.region);
        println!("  S3 Bucket: {}", self.aws.s3_bucket);
        if let Some(prefix) = &self.aws.s3_key_prefix {
            println!("  S3 Prefix: {}", prefix);
        }
        println!("  URL Expiry: {}s", self.aws.url_expiry_secs);
        println!("  Gemini Model: {}", self.gemini.model);
        println!(
            "  Gemini API Key: {}",
            if self.gemini.api_key.is_empty() { "<not set>" } else { "<set>" }
        );
        println!("  OpenSubtitles: {}", self.opensubtitles.base_url);
        println!("  Extensions: {}", self.opensubtitles.extensions.join(", "));
        println!("  Limit: {}", self.opensubtitles.limit);
        println!("  Languages: {}", self.languages.allowed.join(", "));
        println!("  Translate From: {}", self.languages.source);
    }

    /// Get AWS region
    pub fn aws_region(&self) -> Region {
        Region::new(self.aws.region.clone())
    }
}
