use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "dramabox",
    version,
    about = "Browse trending dramas, search the catalog and play episodes"
)]
pub struct Cli {
    /// Base URL of the content API (overrides DRAMABOX_API_BASE)
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive catalog browser (default)
    Tui,
    /// Print the trending list
    Trending,
    /// Search the catalog
    Search { query: String },
    /// List the episodes of a drama
    Episodes { book_id: String },
    /// Play an episode of a drama in the configured player
    Play {
        book_id: String,
        /// 1-based episode number
        #[arg(long, short, default_value_t = 1)]
        episode: usize,
    },
}
