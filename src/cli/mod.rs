use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "subtrans",
    about = "Subtrans - OpenSubtitles search with Gemini-translated Spanish tracks stored on S3",
    version,
    long_about = "Searches OpenSubtitles for a movie or episode, keeps the English and Spanish subtitles, translates every English subtitle to Spanish with Google Gemini and uploads the result to S3, printing the combined list the way a Stremio addon would serve it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and translate subtitles for a video
    Subtitles {
        /// IMDb id, optionally Stremio-style with season and episode (tt0944947:1:2)
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,

        /// Season number (overrides the one in the video id)
        #[arg(long)]
        season: Option<u32>,

        /// Episode number (overrides the one in the video id)
        #[arg(long)]
        episode: Option<u32>,

        /// Extra search filter, e.g. `--filter limit=3` or `--filter extensions=srt,vtt`
        #[arg(short = 'F', long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    Json,
    /// One subtitle per line
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Parse a `key=value` search filter
pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty filter key in '{}'", raw));
    }

    Ok((key.to_string(), value.trim().to_string()))
}
