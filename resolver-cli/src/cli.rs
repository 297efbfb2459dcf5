use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "ANIMEWORLD_RESOLVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an episode id into a playable stream url
    Stream {
        /// Episode id, e.g. `bleach-1x13`
        episode_id: String,
    },

    /// Show the parsed episode page
    Episode { episode_id: String },

    /// List the sources of one server of an episode
    Servers {
        episode_id: String,
        server_id: String,
    },

    /// Resolve an embed or player url directly
    Resolve {
        url: String,

        /// Referer forwarded with the first request
        #[arg(long)]
        referer: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}
