//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// iRODS HTTP API test suite configuration tool
#[derive(Parser, Debug)]
#[command(name = "irods-http-test")]
#[command(version)]
#[command(about = "Manage and check the iRODS HTTP API test configuration")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (overrides discovery and IRODS_HTTP_TEST_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Configuration document format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    #[value(alias = "yml")]
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn is_yaml(self) -> bool {
        self == ConfigFormat::Yaml
    }

    pub fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
        }
    }
}

/// Preflight report format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the configuration file
    Config(ConfigArgs),

    /// Print the URLs and paths the test suite will use
    Urls,

    /// Check that the configured server is reachable
    Preflight(PreflightArgs),
}

/// Arguments for config management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write the default configuration to a file
    Init {
        /// Output file [default: irods-http-test.<format>]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format; inferred from the output extension by default
        #[arg(short, long, value_enum)]
        format: Option<ConfigFormat>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the resolved configuration
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Yaml)]
        format: ConfigFormat,

        /// Mask passwords
        #[arg(long)]
        redact: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file; the resolved source when omitted
        file: Option<PathBuf>,
    },

    /// Show environment variable overrides
    Env,
}

/// Arguments for preflight command
#[derive(Parser, Debug)]
pub struct PreflightArgs {
    /// Request timeout in seconds
    #[arg(short, long, default_value = "10")]
    pub timeout: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,
}
