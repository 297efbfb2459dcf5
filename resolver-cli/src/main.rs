mod cli;
mod output;

use std::process;

use anyhow::Context;
use clap::Parser;
use episode_resolver::{EpisodeService, RequestHeaders, ResolverConfig};
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::{Args, Commands, OutputFormat};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let format = args.output;

    if let Err(e) = run(args).await {
        if format == OutputFormat::Json {
            let error_json = serde_json::json!({
                "status": "error",
                "message": format!("{e:#}"),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {:#}", e);
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    init_logging(args.verbose, args.quiet);

    let config = match &args.config {
        Some(path) => ResolverConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ResolverConfig::default(),
    };
    let service = EpisodeService::new(config).context("Failed to build resolver")?;

    let rendered = match args.command {
        Commands::Stream { episode_id } => {
            let stream = service
                .resolve_episode_stream(&episode_id)
                .await
                .with_context(|| format!("Failed to resolve episode {episode_id}"))?;
            output::format_stream(&stream, args.output)?
        }
        Commands::Episode { episode_id } => {
            let episode = service
                .scrape_episode(&episode_id)
                .await
                .with_context(|| format!("Failed to fetch episode {episode_id}"))?;
            output::format_episode(&episode, args.output)?
        }
        Commands::Servers {
            episode_id,
            server_id,
        } => {
            let sources = service
                .episode_server(&episode_id, &server_id)
                .await
                .with_context(|| format!("Failed to fetch server {server_id} of {episode_id}"))?;
            output::format_sources(&sources, args.output)?
        }
        Commands::Resolve { url, referer } => {
            let mut headers = RequestHeaders::default();
            if let Some(referer) = referer {
                headers.insert("Referer".to_string(), referer);
            }
            let stream = service.resolver().resolve(&url, Some(&headers)).await;
            output::format_stream(&stream, args.output)?
        }
    };

    println!("{rendered}");
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
