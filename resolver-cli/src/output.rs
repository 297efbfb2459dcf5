#[cfg(feature = "colored-output")]
use colored::*;
use episode_resolver::{EpisodeDetails, ResolvedStream, SourceCandidate};
use serde::Serialize;

use crate::cli::OutputFormat;

fn label(text: &str) -> String {
    #[cfg(feature = "colored-output")]
    {
        text.yellow().to_string()
    }
    #[cfg(not(feature = "colored-output"))]
    {
        text.to_string()
    }
}

fn heading(text: &str) -> String {
    #[cfg(feature = "colored-output")]
    {
        text.green().bold().to_string()
    }
    #[cfg(not(feature = "colored-output"))]
    {
        text.to_string()
    }
}

fn json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn format_stream(stream: &ResolvedStream, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return json(stream);
    }
    if !stream.success {
        return Ok(heading("No playable stream found"));
    }
    Ok(format!(
        "{}\n  {}: {}\n  {}: {}",
        heading("Stream:"),
        label("Kind"),
        stream.media_kind,
        label("URL"),
        stream.url().unwrap_or_default()
    ))
}

pub fn format_sources(sources: &[SourceCandidate], format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return json(&sources);
    }
    if sources.is_empty() {
        return Ok(heading("No sources found"));
    }
    let mut output = heading("Sources:");
    for source in sources {
        output.push_str(&format!("\n  [{}] {}", source.kind, source.url));
        if let Some(name) = &source.label {
            output.push_str(&format!(" ({name})"));
        }
    }
    Ok(output)
}

pub fn format_episode(episode: &EpisodeDetails, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return json(episode);
    }
    let mut output = format!(
        "{}\n  {}: {}\n  {}: S{} E{}",
        heading("Episode:"),
        label("Title"),
        episode.title,
        label("Number"),
        episode.season_number,
        episode.episode_number
    );
    if let Some(thumbnail) = &episode.thumbnail {
        output.push_str(&format!("\n  {}: {thumbnail}", label("Thumbnail")));
    }
    output.push('\n');
    output.push_str(&format_sources(&episode.sources, format)?);
    if !episode.servers.is_empty() {
        output.push('\n');
        output.push_str(&heading("Servers:"));
        for server in &episode.servers {
            output.push_str(&format!("\n  {}: {} {}", server.id, server.name, server.url));
        }
    }
    if !episode.downloads.is_empty() {
        output.push('\n');
        output.push_str(&heading("Downloads:"));
        for download in &episode.downloads {
            output.push_str(&format!("\n  [{}] {}", download.quality, download.url));
        }
    }
    Ok(output)
}
