use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "scantally")]
#[command(about = "Record barcode scans offline and sync them to a scantally server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local scan log
    #[arg(long, global = true, value_name = "PATH", env = "SCANTALLY_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Base URL of the scantally server
    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "SCANTALLY_SERVER_URL",
        default_value = DEFAULT_SERVER_URL
    )]
    pub server: String,

    /// Per-request timeout for server calls
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        env = "SCANTALLY_HTTP_TIMEOUT_SECS",
        default_value_t = 10
    )]
    pub timeout_secs: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record one scan and try to sync it
    Scan {
        /// Scanned SKU or barcode value
        sku: String,
        /// Units counted by this scan
        #[arg(short, long, default_value_t = 1)]
        count: i64,
        /// Queue the scan without contacting the server
        #[arg(long)]
        offline: bool,
    },
    /// Read one SKU per stdin line and sync in the background
    Session {
        /// Quiet period before a queued sync is sent
        #[arg(long, value_name = "MS", default_value_t = 500)]
        delay_ms: u64,
        /// Queue scans without contacting the server
        #[arg(long)]
        offline: bool,
    },
    /// List scans in the local log
    List {
        /// Only scans the server has not acknowledged
        #[arg(long)]
        unsynced: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-SKU totals from the local log
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show pending scans and server reachability
    Status,
    /// Push every unsynced scan now
    Sync,
    /// Discard unsynced scans
    Discard {
        /// Local id of the scan to discard
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<i64>,
        /// Discard every unsynced scan
        #[arg(long)]
        all: bool,
    },
    /// Query the server's stored scans
    Remote {
        /// Number of scans to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Show per-SKU totals instead of recent scans
        #[arg(long)]
        summary: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
