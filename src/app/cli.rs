use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Show whether files or directories exist, as a status bar block"
)]
pub struct Cli {
    /// Module instance to load from the config file
    #[arg(long)]
    pub instance: Option<String>,

    /// Config file to read instead of ~/.config/file_status/config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Paths to check; wildcards and ~ are allowed (e.g., '~/Videos/*.mp4')
    #[arg(long, num_args = 1..)]
    pub path: Option<Vec<String>>,

    /// Display format for the block
    #[arg(long)]
    pub format: Option<String>,

    /// Format for each matched path
    #[arg(long)]
    pub format_path: Option<String>,

    /// Shown between formatted paths
    #[arg(long)]
    pub format_path_separator: Option<String>,

    /// Seconds between refreshes
    #[arg(long)]
    pub cache_timeout: Option<u64>,

    /// Keep running, printing a new line whenever the block is refreshed
    #[arg(long)]
    pub watch: bool,

    /// Print i3bar JSON blocks instead of plain text
    #[arg(long)]
    pub json: bool,
}
