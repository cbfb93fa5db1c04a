//! Configuration file management
//!
//! Handles finding the configuration file and layering it with the
//! environment.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ConfigError, EnvConfig, TestConfig};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./irods-http-test.yaml",
    "./irods-http-test.yml",
    "./irods-http-test.json",
    "./.irods-http-test/config.yaml",
    "~/.config/irods-http-test/config.yaml",
];

/// A resolved configuration and the file it came from
#[derive(Clone, Debug)]
pub struct ConfigFile {
    /// Source file, `None` when built-in defaults were used
    pub path: Option<PathBuf>,
    pub config: TestConfig,
    /// Fields overridden from `IRODS_HTTP_TEST_*` variables
    pub overrides: Vec<&'static str>,
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        find_in(CONFIG_LOCATIONS)
    }

    /// Built-in defaults, no source file
    pub fn defaults() -> Self {
        Self {
            path: None,
            config: TestConfig::default(),
            overrides: Vec::new(),
        }
    }

    /// Resolve the configuration from every source
    ///
    /// Precedence: environment variables, then the explicit path or
    /// `IRODS_HTTP_TEST_CONFIG`, then a discovered file, then defaults.
    /// Runs before logging is set up; call [`ConfigFile::log_source`] once
    /// a subscriber exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env = EnvConfig::load();
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_ref().map(PathBuf::from))
            .or_else(Self::find);

        let mut resolved = match path {
            Some(path) => Self {
                config: TestConfig::load_unchecked(&path)?,
                path: Some(path),
                overrides: Vec::new(),
            },
            None => Self::defaults(),
        };

        resolved.overrides = env.apply(&mut resolved.config);
        resolved.config.validate()?;

        Ok(resolved)
    }

    /// Log where the configuration came from and what the environment changed
    pub fn log_source(&self) {
        if self.path.is_none() {
            debug!("No configuration file found, using defaults");
        }
        info!("Using configuration from {}", self.source());
        for field in &self.overrides {
            debug!("Overriding {} from environment", field);
        }
    }

    /// Human-readable source description
    pub fn source(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<defaults>".to_string())
    }
}

fn find_in(locations: &[&str]) -> Option<PathBuf> {
    locations
        .iter()
        .map(|location| expand_path(location))
        .find(|path| path.exists())
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
