use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subtrans::cli::{Cli, Commands};
use subtrans::config::Config;
use subtrans::output;
use subtrans::search::SearchQuery;
use subtrans::SubtitlePipeline;

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "subtrans=debug" } else { "subtrans=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Subtitles {
            video_id,
            season,
            episode,
            filters,
            output,
            format,
        } => {
            let config = Config::load().await?;
            let pipeline = SubtitlePipeline::from_config(&config).await;

            let mut query = SearchQuery::with_defaults(
                &video_id,
                &config.opensubtitles.extensions,
                config.opensubtitles.limit,
            );
            if let Some(season) = season {
                query = query.filter("season", &season.to_string());
            }
            if let Some(episode) = episode {
                query = query.filter("episode", &episode.to_string());
            }
            for (key, value) in &filters {
                query = query.filter(key, value);
            }

            tracing::info!("Generating subtitles for {}", query.video_id);
            let subtitles = pipeline.generate_subtitles(&query).await;

            match output {
                Some(path) => {
                    output::save_to_file(&subtitles, &path, &format).await?;
                    println!("Subtitles saved to: {}", path.display());
                }
                None => output::print_to_console(&subtitles, &format)?,
            }
        }
        Commands::Config { show } => {
            if show {
                let mut config = match Config::config_path() {
                    Ok(path) if path.exists() => Config::load_from(&path)?,
                    _ => Config::default(),
                };
                config.apply_env_overrides(|key| std::env::var(key).ok());
                config.display();
                if let Err(e) = config.validate() {
                    println!("  Warning: {}", e);
                }
            } else {
                let path = Config::config_path()?;
                if path.exists() {
                    println!("Configuration already exists: {}", path.display());
                } else {
                    Config::default().save().await?;
                    println!("Default configuration written to: {}", path.display());
                }
            }
        }
    }

    Ok(())
}
