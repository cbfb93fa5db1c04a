//! Configuration module
//!
//! Connection parameters consumed by the iRODS HTTP API test suite.

mod env;
mod file;
mod validate;

pub use env::{print_env_help, EnvConfig};
pub use file::ConfigFile;
pub use validate::ValidationError;

#[cfg(test)]
pub use env::{env_lock, EnvBuilder};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::logger::LogLevel;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Account roles used by the test suite
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    Rodsadmin,
    Rodsuser,
}

impl AccountRole {
    /// Configuration key for this role
    pub fn key(&self) -> &'static str {
        match self {
            AccountRole::Rodsadmin => "rodsadmin",
            AccountRole::Rodsuser => "rodsuser",
        }
    }

    pub fn all() -> [AccountRole; 2] {
        [AccountRole::Rodsadmin, AccountRole::Rodsuser]
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Username/password pair for one account role
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Copy with the password masked
    pub fn redacted(&self) -> Self {
        Self {
            username: self.username.clone(),
            password: mask(&self.password),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

pub(crate) fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// Test suite configuration
///
/// Loaded once when the test process starts and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Target server hostname
    pub host: String,

    /// Target server port
    pub port: u16,

    /// API path prefix
    pub url_base: String,

    /// Administrative credential pair
    pub rodsadmin: Credentials,

    /// Regular-user credential pair
    pub rodsuser: Credentials,

    /// Zone the server belongs to
    pub irods_zone: String,

    /// Gates the GenQuery2 tests
    pub run_genquery2_tests: bool,

    /// Hostname of the iRODS server behind the HTTP API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irods_server_hostname: Option<String>,

    /// Log level for the suite, a name or a numeric Python `logging` level
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_log_level"
    )]
    pub log_level: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLogLevel {
    Name(String),
    Number(i64),
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<RawLogLevel>::deserialize(deserializer)?.map(|raw| match raw {
            RawLogLevel::Name(name) => name,
            RawLogLevel::Number(level) => level.to_string(),
        }),
    )
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            url_base: "/irods-http-api/0.1.0".to_string(),
            rodsadmin: Credentials::new("rods", "rods"),
            rodsuser: Credentials::new("http_api", "http_api"),
            irods_zone: "tempZone".to_string(),
            run_genquery2_tests: false,
            irods_server_hostname: None,
            log_level: None,
        }
    }
}

impl TestConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_unchecked(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration without validating it
    pub fn load_unchecked(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, is_yaml_file(path)).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse a YAML or JSON document
    pub fn parse(content: &str, yaml: bool) -> Result<Self, String> {
        if yaml {
            serde_yaml::from_str(content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(content).map_err(|e| e.to_string())
        }
    }

    /// Save configuration to file, format from the extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.save_as(path, is_yaml_file(path))
    }

    /// Save configuration as YAML or JSON regardless of extension
    pub fn save_as(&self, path: impl AsRef<Path>, yaml: bool) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.render(yaml)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize as YAML or pretty JSON
    pub fn render(&self, yaml: bool) -> Result<String, ConfigError> {
        if yaml {
            serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
        } else {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
        }
    }

    /// Check every structural invariant
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = validate::check(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Copy with both passwords masked
    pub fn redacted(&self) -> Self {
        Self {
            rodsadmin: self.rodsadmin.redacted(),
            rodsuser: self.rodsuser.redacted(),
            ..self.clone()
        }
    }

    /// `http://{host}:{port}{url_base}`
    pub fn base_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.host,
            self.port,
            self.url_base.trim_end_matches('/')
        )
    }

    /// URL of a named endpoint, e.g. `authenticate`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url(), endpoint.trim_start_matches('/'))
    }

    pub fn credentials(&self, role: AccountRole) -> &Credentials {
        match role {
            AccountRole::Rodsadmin => &self.rodsadmin,
            AccountRole::Rodsuser => &self.rodsuser,
        }
    }

    /// Logical path of a role's home collection
    pub fn home_collection(&self, role: AccountRole) -> String {
        format!(
            "/{}/home/{}",
            self.irods_zone,
            self.credentials(role).username
        )
    }

    pub fn genquery2_enabled(&self) -> bool {
        self.run_genquery2_tests
    }

    /// Reason to report when GenQuery2 tests are skipped
    pub fn genquery2_skip_reason(&self) -> Option<&'static str> {
        (!self.genquery2_enabled()).then_some(
            "GenQuery2 tests not enabled. Check [run_genquery2_tests] in test configuration file.",
        )
    }

    /// Configured log level, `info` when unset or unrecognised
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::from_str)
            .unwrap_or(LogLevel::Info)
    }
}

/// Check if file is YAML based on extension
pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const REQUIRED_KEYS: [&str; 7] = [
        "host",
        "port",
        "url_base",
        "rodsadmin",
        "rodsuser",
        "irods_zone",
        "run_genquery2_tests",
    ];

    #[test]
    fn test_default_config() {
        let config = TestConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9000);
        assert_eq!(config.url_base, "/irods-http-api/0.1.0");
        assert_eq!(config.rodsadmin, Credentials::new("rods", "rods"));
        assert_eq!(config.rodsuser, Credentials::new("http_api", "http_api"));
        assert_eq!(config.irods_zone, "tempZone");
        assert!(!config.run_genquery2_tests);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_has_exactly_required_keys() {
        let value = serde_json::to_value(TestConfig::default()).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = REQUIRED_KEYS.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);

        assert!(object["port"].as_u64().unwrap() > 0);
        assert!(object["run_genquery2_tests"].is_boolean());
        for role in ["rodsadmin", "rodsuser"] {
            let pair = object[role].as_object().unwrap();
            assert_eq!(pair.len(), 2);
            assert!(!pair["username"].as_str().unwrap().is_empty());
            assert!(!pair["password"].as_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let full = serde_json::to_value(TestConfig::default()).unwrap();
        for key in REQUIRED_KEYS {
            let mut doc = full.clone();
            doc.as_object_mut().unwrap().remove(key);
            let result = TestConfig::parse(&doc.to_string(), false);
            assert!(result.is_err(), "document without '{key}' was accepted");
        }

        for role in ["rodsadmin", "rodsuser"] {
            for field in ["username", "password"] {
                let mut doc = full.clone();
                doc[role].as_object_mut().unwrap().remove(field);
                let result = TestConfig::parse(&doc.to_string(), false);
                assert!(result.is_err(), "{role} without '{field}' was accepted");
            }

            let mut doc = full.clone();
            doc[role]["token"] = serde_json::json!("abc");
            let result = TestConfig::parse(&doc.to_string(), false);
            assert!(result.is_err(), "{role} with unknown key was accepted");

            let mut doc = full.clone();
            doc[role] = serde_json::json!(null);
            assert!(TestConfig::parse(&doc.to_string(), false).is_err());
        }
    }

    #[test]
    fn test_unknown_and_mistyped_keys_are_rejected() {
        let yaml = "host: localhost\nport: 9000\nurl_base: /api\nirods_zone: tempZone\n\
                    run_genquery2_tests: false\nprot: 1\n\
                    rodsadmin: {username: rods, password: rods}\n\
                    rodsuser: {username: u, password: p}\n";
        assert!(TestConfig::parse(yaml, true).is_err());

        let yaml = "host: localhost\nport: 9000\nurl_base: /api\nirods_zone: tempZone\n\
                    run_genquery2_tests: \"sometimes\"\n\
                    rodsadmin: {username: rods, password: rods}\n\
                    rodsuser: {username: u, password: p}\n";
        assert!(TestConfig::parse(yaml, true).is_err());
    }

    #[test]
    fn test_optional_keys_are_accepted() {
        let yaml = "host: irods.example.org\nport: 8080\nurl_base: /api/v1\n\
                    irods_zone: otherZone\nrun_genquery2_tests: true\n\
                    irods_server_hostname: provider\nlog_level: debug\n\
                    rodsadmin: {username: rods, password: rods}\n\
                    rodsuser: {username: alice, password: secret}\n";
        let config = TestConfig::parse(yaml, true).unwrap();
        assert_eq!(config.irods_server_hostname.as_deref(), Some("provider"));
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert!(config.genquery2_enabled());
        assert!(config.genquery2_skip_reason().is_none());
    }

    #[test]
    fn test_numeric_and_critical_log_levels() {
        let mut doc = serde_json::to_value(TestConfig::default()).unwrap();
        doc["log_level"] = serde_json::json!(10);
        let config = TestConfig::parse(&doc.to_string(), false).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("10"));
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert!(config.validate().is_ok());

        doc["log_level"] = serde_json::json!("CRITICAL");
        let config = TestConfig::parse(&doc.to_string(), false).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("CRITICAL"));
        assert_eq!(config.log_level(), LogLevel::Error);
        assert!(config.validate().is_ok());

        let yaml = "host: localhost\nport: 9000\nurl_base: /api\nirods_zone: tempZone\n\
                    run_genquery2_tests: false\nlog_level: 50\n\
                    rodsadmin: {username: rods, password: rods}\n\
                    rodsuser: {username: u, password: p}\n";
        let config = TestConfig::parse(yaml, true).unwrap();
        assert_eq!(config.log_level(), LogLevel::Error);

        doc["log_level"] = serde_json::json!(15);
        let config = TestConfig::parse(&doc.to_string(), false).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_as_ignores_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing/dir/suite.conf");
        TestConfig::default().save_as(&path, true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(TestConfig::parse(&content, true).unwrap(), TestConfig::default());
    }

    #[test]
    fn test_urls() {
        let config = TestConfig::default();
        assert_eq!(config.base_url(), "http://localhost:9000/irods-http-api/0.1.0");
        assert_eq!(
            config.endpoint_url("authenticate"),
            "http://localhost:9000/irods-http-api/0.1.0/authenticate"
        );

        let config = TestConfig {
            url_base: "/api/".to_string(),
            ..TestConfig::default()
        };
        assert_eq!(config.endpoint_url("/info"), "http://localhost:9000/api/info");
    }

    #[test]
    fn test_home_collection() {
        let config = TestConfig::default();
        assert_eq!(
            config.home_collection(AccountRole::Rodsuser),
            "/tempZone/home/http_api"
        );
        assert_eq!(
            config.home_collection(AccountRole::Rodsadmin),
            "/tempZone/home/rods"
        );
    }

    #[test]
    fn test_genquery2_skip_reason() {
        let config = TestConfig::default();
        assert!(!config.genquery2_enabled());
        assert!(config
            .genquery2_skip_reason()
            .unwrap()
            .contains("run_genquery2_tests"));
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let config = TestConfig {
            rodsuser: Credentials::new("alice", "hunter2"),
            ..TestConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));

        let redacted = config.redacted();
        assert_eq!(redacted.rodsuser.username, "alice");
        assert_eq!(redacted.rodsuser.password, "********");
    }

    #[test]
    fn test_save_load_yaml_and_json() {
        let dir = tempdir().unwrap();
        let config = TestConfig {
            irods_zone: "otherZone".to_string(),
            ..TestConfig::default()
        };

        for name in ["config.yaml", "nested/config.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(TestConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_load_reports_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = TestConfig {
            port: 0,
            ..TestConfig::default()
        };
        config.save(&path).unwrap();

        match TestConfig::load(&path) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors, vec![ValidationError::InvalidPort]);
            }
            other => panic!("Expected Invalid error, got {other:?}"),
        }
        assert!(TestConfig::load_unchecked(&path).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = TestConfig::load(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
