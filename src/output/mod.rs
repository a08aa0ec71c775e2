use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::subtitles::SubtitleDescriptor;

/// Render subtitles in the requested format
pub fn render(subtitles: &[SubtitleDescriptor], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => format_as_json(subtitles),
        OutputFormat::Text => Ok(format_as_text(subtitles)),
    }
}

pub fn format_as_json(subtitles: &[SubtitleDescriptor]) -> Result<String> {
    serde_json::to_string_pretty(subtitles).context("Failed to serialize subtitles")
}

pub fn format_as_text(subtitles: &[SubtitleDescriptor]) -> String {
    if subtitles.is_empty() {
        return "No subtitles found".to_string();
    }

    let id_width = subtitles.iter().map(|s| s.id.len()).max().unwrap_or(0);
    let lang_width = subtitles.iter().map(|s| s.lang.chars().count()).max().unwrap_or(0);

    subtitles
        .iter()
        .map(|s| format!("{:<id_width$}  {:<lang_width$}  {}", s.id, s.lang, s.url))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Save subtitle list to file
pub async fn save_to_file(
    subtitles: &[SubtitleDescriptor],
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let content = render(subtitles, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print subtitle list to console
pub fn print_to_console(subtitles: &[SubtitleDescriptor], format: &OutputFormat) -> Result<()> {
    println!("{}", render(subtitles, format)?);
    Ok(())
}
