//! iRODS HTTP API test configuration
//!
//! Connection parameters for the iRODS HTTP API test suite: server host,
//! port and URL base, credentials for the rodsadmin and rodsuser roles,
//! the zone name and the GenQuery2 feature flag.
//!
//! ## Usage
//!
//! ```bash
//! # Write the default configuration
//! irods-http-test config init
//!
//! # Show the resolved configuration (file + IRODS_HTTP_TEST_* overrides)
//! irods-http-test config show --redact
//!
//! # Print the URLs the suite will call
//! irods-http-test urls
//!
//! # Check the server answers at the configured URL base
//! irods-http-test preflight
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod cli;
mod config;
mod http;
mod preflight;
mod utils;

use cli::{Args, ConfigFormat, ReportFormat};
use config::{AccountRole, ConfigError, ConfigFile, EnvConfig, TestConfig};
use preflight::PreflightChecker;
use utils::logger::{init_logger, LogLevel};

/// Endpoints exercised by the test suite
const ENDPOINTS: &[&str] = &[
    "authenticate",
    "info",
    "collections",
    "data-objects",
    "query",
    "resources",
    "rules",
    "tickets",
    "users-groups",
    "zones",
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolved = ConfigFile::resolve(args.config.as_deref());

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        resolved
            .as_ref()
            .map(|r| r.config.log_level())
            .unwrap_or(LogLevel::Info)
    };
    init_logger(level);

    if let Ok(resolved) = &resolved {
        resolved.log_source();
    }

    match args.command {
        cli::Command::Config(config_args) => {
            manage_config(config_args, resolved)?;
        }
        cli::Command::Urls => {
            let resolved = resolved.context("Failed to resolve configuration")?;
            print_urls(&resolved);
        }
        cli::Command::Preflight(preflight_args) => {
            let resolved = resolved.context("Failed to resolve configuration")?;
            run_preflight(preflight_args, &resolved.config).await?;
        }
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, resolved: Result<ConfigFile, ConfigError>) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init {
            output,
            format,
            force,
        } => {
            let (output, yaml) = init_target(output, format)?;
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            TestConfig::default().save_as(&output, yaml)?;

            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to point the test suite at your server.");
        }

        cli::ConfigAction::Show { format, redact } => {
            let resolved = resolved.context("Failed to resolve configuration")?;
            debug!("Configuration source: {}", resolved.source());

            let config = if redact {
                resolved.config.redacted()
            } else {
                resolved.config
            };
            println!("{}", config.render(format.is_yaml())?);
        }

        cli::ConfigAction::Validate { file } => {
            let (source, result) = match file {
                Some(path) => (path.display().to_string(), validate_file(&path)),
                None => match resolved {
                    Ok(resolved) => (resolved.source(), Ok(())),
                    Err(e) => ("<resolved configuration>".to_string(), Err(e)),
                },
            };

            match result {
                Ok(()) => {
                    println!("✓ Configuration is valid: {source}");
                }
                Err(ConfigError::Invalid(errors)) => {
                    println!("✗ Configuration is invalid: {source}");
                    for error in &errors {
                        println!("  - {error}");
                    }
                    anyhow::bail!("{} validation error(s)", errors.len());
                }
                Err(e) => {
                    println!("✗ Configuration could not be loaded: {source}");
                    println!("  Error: {e}");
                    return Err(e.into());
                }
            }
        }

        cli::ConfigAction::Env => {
            let env_config = EnvConfig::load();
            if env_config.has_any() {
                env_config.print_summary();
            } else {
                println!("No IRODS_HTTP_TEST_* overrides are set.\n");
                config::print_env_help();
            }
        }
    }

    Ok(())
}

fn validate_file(path: &Path) -> Result<(), ConfigError> {
    TestConfig::load(path).map(|_| ())
}

/// Output path and format for `config init`
///
/// The written file must load back, and loading picks the parser from the
/// extension, so an explicit format has to agree with it.
fn init_target(output: Option<PathBuf>, format: Option<ConfigFormat>) -> Result<(PathBuf, bool)> {
    match (output, format) {
        (None, format) => {
            let format = format.unwrap_or(ConfigFormat::Yaml);
            let output = PathBuf::from(format!("irods-http-test.{}", format.extension()));
            Ok((output, format.is_yaml()))
        }
        (Some(output), None) => {
            let yaml = config::is_yaml_file(&output);
            Ok((output, yaml))
        }
        (Some(output), Some(format)) => {
            if config::is_yaml_file(&output) != format.is_yaml() {
                anyhow::bail!(
                    "Output {} would not be read back as {}; use a .{} extension",
                    output.display(),
                    format.extension(),
                    format.extension()
                );
            }
            Ok((output, format.is_yaml()))
        }
    }
}

fn print_urls(resolved: &ConfigFile) {
    let config = &resolved.config;

    println!("\nConfiguration: {}", resolved.source());
    println!("{:-<60}", "");
    println!("  Base URL: {}", config.base_url());
    println!("  Zone:     {}", config.irods_zone);
    if let Some(hostname) = &config.irods_server_hostname {
        println!("  Server:   {hostname}");
    }

    println!("\nEndpoints:");
    for endpoint in ENDPOINTS {
        println!("  {:14} {}", endpoint, config.endpoint_url(endpoint));
    }

    println!("\nAccounts:");
    for role in AccountRole::all() {
        println!(
            "  {:10} {:12} home: {}",
            role,
            config.credentials(role).username,
            config.home_collection(role)
        );
    }

    println!(
        "\nGenQuery2 tests: {}",
        config.genquery2_skip_reason().unwrap_or("enabled")
    );
    println!();
}

async fn run_preflight(args: cli::PreflightArgs, config: &TestConfig) -> Result<()> {
    let checker = PreflightChecker::new(args.timeout)?;
    let report = checker.run(config).await;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Table => println!("{}", report.format_table()),
    }

    if !report.healthy {
        anyhow::bail!("Preflight checks failed for {}", report.url);
    }

    info!("Server at {} is ready for the test suite", config.base_url());
    Ok(())
}
