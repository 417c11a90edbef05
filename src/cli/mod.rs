//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod commands;

/// social-recall - semantic memory for social media captions
#[derive(Parser, Debug)]
#[command(name = "recall", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Qdrant gRPC endpoint
    #[arg(long, global = true, env = "QDRANT_URL")]
    pub qdrant_url: Option<String>,

    /// Output as JSON (for agent integration)
    #[arg(long, alias = "robot", global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store information in a collection
    Store(StoreArgs),

    /// Find entries relevant to a query
    Find(FindArgs),

    /// List collections in Qdrant
    Collections,

    /// Show the embedding model configuration and local cache state
    Model {
        /// Also load the model and report its vector metadata
        #[arg(long)]
        load: bool,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Text to remember
    pub information: String,

    /// Metadata as a JSON object
    #[arg(long, short)]
    pub metadata: Option<String>,

    /// Target collection (default: COLLECTION_NAME)
    #[arg(long, short)]
    pub collection: Option<String>,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Natural-language query
    pub query: String,

    /// Maximum number of results (default: QDRANT_SEARCH_LIMIT)
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Collection to search (default: COLLECTION_NAME)
    #[arg(long, short)]
    pub collection: Option<String>,

    /// Qdrant filter as a JSON object
    #[arg(long)]
    pub filter: Option<String>,

    /// Print the tool reply text instead of the result listing
    #[arg(long)]
    pub reply: bool,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
