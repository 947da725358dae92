use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "siteward")]
#[command(version)]
#[command(about = "Submit websites for vulnerability scanning and review the results")]
pub struct Cli {
    /// Base URL of the scan backend (overrides SITEWARD_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides SITEWARD_TOKEN and the stored token)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// More diagnostic output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// the command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a URL for scanning and follow it to the end
    Scan {
        /// The website to scan (http:// or https://)
        url: String,

        /// Seconds between status checks
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Print the report as text instead of opening the viewer
        #[arg(short, long, default_value_t = false)]
        plain: bool,

        /// Also save the report as JSON into this directory
        #[arg(short, long)]
        export: Option<String>,

        /// Replay a canned scan without contacting any backend
        #[arg(long, default_value_t = false)]
        demo: bool,
    },

    /// Follow a scan that was already started
    Watch {
        /// Scan id returned by the backend
        id: String,

        /// The scanned URL, shown in the report header
        #[arg(short, long)]
        url: Option<String>,

        /// Seconds between status checks
        #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Print the report as text instead of opening the viewer
        #[arg(short, long, default_value_t = false)]
        plain: bool,

        /// Also save the report as JSON into this directory
        #[arg(short, long)]
        export: Option<String>,
    },

    /// List previous scans
    History {
        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Scans per page (1-100)
        #[arg(long, default_value_t = 10)]
        size: u32,
    },

    /// Open a saved report
    Show {
        /// Path to a scan-report-*.json file
        file: String,

        /// Print the report as text instead of opening the viewer
        #[arg(short, long, default_value_t = false)]
        plain: bool,
    },

    /// Print remediation steps for a vulnerability type, e.g. SQL_INJECTION
    Remediation {
        /// Vulnerability type
        kind: String,
    },

    /// Manage stored credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the bearer token
    SetToken {
        token: String,
    },

    /// Store the backend base URL
    SetUrl {
        url: String,
    },

    /// Forget the stored token
    Clear,

    /// Show where credentials come from
    Status,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
