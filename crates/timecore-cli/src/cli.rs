use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use timecore_core::ReportScope;

#[derive(Parser)]
#[command(name = "timecore")]
#[command(about = "Browse and edit TimeCore time reports from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Report family to work on (admin or user); overrides the profile
    #[arg(long, global = true, value_name = "SCOPE")]
    pub scope: Option<ReportScope>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List, watch and edit time reports
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Work with report item lists
    Items {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
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

/// Filters shared by the report commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First day to include
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,
    /// Last day to include
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,
    /// Free-text search
    #[arg(short = 'q', long)]
    pub search: Option<String>,
    /// Only billed (true) or unbilled (false) reports
    #[arg(long, value_name = "BOOL")]
    pub billed: Option<bool>,
    /// Only reports of this user
    #[arg(long, value_name = "ID")]
    pub user: Option<i64>,
    /// Only reports of these users (comma separated)
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub users: Vec<i64>,
    /// Page size
    #[arg(short, long)]
    pub limit: Option<u32>,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// List reports page by page
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep a report list on screen and refresh it when the server changes
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
        /// Poll interval in seconds (profile value when omitted)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
        /// Ask before refreshing instead of refreshing right away
        #[arg(long)]
        defer: bool,
    },
    /// Update a report
    Update {
        /// Report ID
        id: i64,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "BOOL")]
        billed: Option<bool>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        #[arg(long, value_name = "ID")]
        project: Option<i64>,
        /// JSON file with the report's current items
        #[arg(long, value_name = "PATH", requires = "items_working")]
        items_baseline: Option<PathBuf>,
        /// JSON file with the edited items
        #[arg(long, value_name = "PATH", requires = "items_baseline")]
        items_working: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a report
    Delete {
        /// Report ID
        id: i64,
    },
    /// Show total, billed and unbilled hours
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a customer's projects
    Projects {
        /// Customer ID
        customer_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Print the upsert/delete instructions between two item lists
    Diff {
        /// JSON file with the server-confirmed items
        baseline: PathBuf,
        /// JSON file with the edited items
        working: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// TimeCore API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Default report scope
        #[arg(long = "default-scope", value_name = "SCOPE")]
        default_scope: Option<ReportScope>,
        /// Default page size
        #[arg(long)]
        page_size: Option<u32>,
        /// Default poll interval in seconds
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,
        /// Session cookie sent with every request
        #[arg(long, value_name = "COOKIE")]
        session: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
