use crate::core::scope::{ScopeSelection, TargetChoice, TargetKind};
use crate::core::services::types::EXPORT_FILE_NAME;
use crate::error::CliError;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "snowparam")]
#[command(about = "Collect Snowflake parameters by scope and export them to a spreadsheet")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Account identifier, e.g. xy12345.us-east-1
    #[arg(long, global = true, env = "SNOWFLAKE_ACCOUNT")]
    pub account: Option<String>,

    /// Login name
    #[arg(long, global = true, env = "SNOWFLAKE_USER")]
    pub user: Option<String>,

    /// Password (or SNOWFLAKE_PASSWORD); prompted for when omitted
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Role to activate after login
    #[arg(long, global = true, env = "SNOWFLAKE_ROLE")]
    pub role: Option<String>,

    /// Base URL override, e.g. a PrivateLink endpoint
    #[arg(long, global = true, env = "SNOWFLAKE_HOST")]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the credentials can log in
    Connect,
    /// List databases or warehouses visible to the role
    Targets {
        /// databases or warehouses
        kind: TargetKind,
    },
    /// Collect parameters and print them
    Fetch {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Collect parameters and write them to an .xlsx workbook
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output path, '-' for stdout
        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: String,
    },
    /// Interactive session keeping one connection open
    Shell,
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Which levels and targets to collect
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Scope level (ACCOUNT, SESSION, DATABASE, WAREHOUSE); repeat or
    /// comma-separate. Defaults to ACCOUNT,SESSION
    #[arg(short, long = "level")]
    pub levels: Vec<String>,

    /// Database to include when DATABASE is selected; ALL or omitted means every database
    #[arg(long = "database")]
    pub databases: Vec<String>,

    /// Warehouse to include when WAREHOUSE is selected; ALL or omitted means every warehouse
    #[arg(long = "warehouse")]
    pub warehouses: Vec<String>,
}

impl SelectionArgs {
    pub fn scope(&self) -> Result<ScopeSelection, CliError> {
        if self.levels.is_empty() {
            return Ok(ScopeSelection::default_levels());
        }
        ScopeSelection::parse_all(&self.levels)
    }

    pub fn choice(&self, kind: TargetKind) -> TargetChoice {
        let values = match kind {
            TargetKind::Database => &self.databases,
            TargetKind::Warehouse => &self.warehouses,
        };
        if values.is_empty() {
            TargetChoice::All
        } else {
            TargetChoice::from_values(values)
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Store a connection default; the password is never stored
    Set {
        /// account, user, role, host or timeout_seconds
        key: String,
        /// New value; an empty string clears the key
        value: String,
    },
}
