use anyhow::Result;
use url::Url;

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed.to_string())
}

/// Turn a video id into something safe to use inside an object key
///
/// Stremio separates season and episode with `:` (`tt0944947:1:2`).
pub fn normalize_video_id(video_id: &str) -> String {
    video_id
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
            _ => '_',
        })
        .collect()
}

/// Object key for the `index`-th (0-based) translation of a video
pub fn translated_subtitle_key(
    prefix: Option<&str>,
    video_id: &str,
    source_lang: &str,
    index: usize,
) -> String {
    format!(
        "{}{}_translated_{}_{}.srt",
        prefix.unwrap_or(""),
        normalize_video_id(video_id),
        source_lang,
        index + 1
    )
}

/// Numeric part of an IMDb id (`tt0133093` -> `133093`)
pub fn imdb_numeric_id(imdb_id: &str) -> String {
    let digits = imdb_id
        .trim()
        .trim_start_matches("tt")
        .trim_start_matches('0');

    if digits.is_empty() {
        "0".to_string()
    } else {
        digits.to_string()
    }
}

/// Split a Stremio video id into IMDb id, season and episode
pub fn parse_video_id(video_id: &str) -> (String, Option<u32>, Option<u32>) {
    let mut parts = video_id.trim().split(':');
    let imdb_id = parts.next().unwrap_or_default().to_string();
    let season = parts.next().and_then(|s| s.parse().ok());
    let episode = parts.next().and_then(|e| e.parse().ok());

    (imdb_id, season, episode)
}

/// Extract domain from URL for display purposes
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
}
