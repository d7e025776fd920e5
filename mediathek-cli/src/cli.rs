use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "MEDIATHEK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a video page to its best playable stream
    Resolve {
        /// Video page URL
        url: String,

        /// Talk to the legacy XML API instead of the configured backend
        #[arg(long)]
        legacy: bool,

        /// Playable URI scheme, repeatable (defaults to the configured schemes)
        #[arg(long = "scheme", value_name = "SCHEME")]
        schemes: Vec<String>,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the entries of an overview page, or the A-Z root
    Browse {
        /// Overview page URL
        url: Option<String>,

        /// Also resolve every listed video
        #[arg(long)]
        resolve: bool,

        /// Playable URI scheme for --resolve, repeatable
        #[arg(long = "scheme", value_name = "SCHEME")]
        schemes: Vec<String>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
}
