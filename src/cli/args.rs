use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::common::config::OutputFormat;

/// sftpsweep — delete aged files from a remote SFTP tree
#[derive(Parser, Debug)]
#[command(
    name = "sftpsweep",
    version,
    disable_help_flag = true,
    about = "Delete files older than a given age from a remote SFTP directory tree",
    long_about = "Recursively searches a remote directory over SFTP and deletes files older\n\
                  than a given age, then removes any sub-directories emptied along the way.\n\
                  Output is quiet by default, use -vv for a reasonable verbosity level.",
    after_help = "EXAMPLES:\n  \
        sftpsweep -h backup.example.org -u joseph -p secretz -t 100 -vv -l\n  \
        sftpsweep -h nas -u ops -i ~/.ssh/id_ed25519 -d /srv/logs -t 30\n  \
        sftpsweep -h nas --agent -d /incoming -t 7 -e '\\.keep$'\n  \
        sftpsweep -h nas --agent -t 0.04167 --include '\\.tmp$' --format json"
)]
pub struct Cli {
    /// SFTP host to connect to
    #[arg(short = 'h', long)]
    pub host: String,

    /// SSH port [default: 22]
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// User name [default: anonymous]
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password
    #[arg(short, long, env = "SFTPSWEEP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Private key file to authenticate with (a --password unlocks it)
    #[arg(short, long, value_name = "FILE", conflicts_with = "agent")]
    pub identity: Option<PathBuf>,

    /// Authenticate with keys from a running ssh-agent
    #[arg(long)]
    pub agent: bool,

    /// Remote directory to start searching from [default: .]
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Minimum age in days before a file is deleted (1 hour = 0.04167 days) [default: 0]
    #[arg(short = 't', long, value_name = "DAYS", allow_negative_numbers = true)]
    pub age: Option<f64>,

    /// Skip entries whose name matches this regex
    #[arg(short, long, value_name = "RE")]
    pub exclude: Option<String>,

    /// Only delete files whose name matches this regex (exclude wins)
    #[arg(long, value_name = "RE")]
    pub include: Option<String>,

    /// Only list what would be deleted, don't delete anything
    #[arg(short, long)]
    pub list_only: bool,

    /// Increase verbosity, e.g. -vv
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Output format [default: human]
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Show every removed path in the report
    #[arg(long)]
    pub detailed: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Read defaults from this file instead of ~/.sftpsweep/config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Timeout in seconds for each remote call, 0 disables
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Refuse hosts missing from known_hosts
    #[arg(long)]
    pub strict_host_keys: bool,

    /// Display this help/usage message
    #[arg(short = '?', long, action = ArgAction::Help)]
    pub help: Option<bool>,
}
