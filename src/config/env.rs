//! Environment variable configuration
//!
//! Provides environment variable overrides for the test configuration.

use std::env;

use super::{mask, TestConfig};

/// Environment variable prefix
const ENV_PREFIX: &str = "IRODS_HTTP_TEST";

/// Overrides read from `IRODS_HTTP_TEST_*` variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Host from IRODS_HTTP_TEST_HOST
    pub host: Option<String>,
    /// Port from IRODS_HTTP_TEST_PORT
    pub port: Option<u16>,
    /// URL base from IRODS_HTTP_TEST_URL_BASE
    pub url_base: Option<String>,
    /// Zone from IRODS_HTTP_TEST_ZONE
    pub zone: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub user_username: Option<String>,
    pub user_password: Option<String>,
    /// GenQuery2 flag from IRODS_HTTP_TEST_RUN_GENQUERY2_TESTS
    pub run_genquery2_tests: Option<bool>,
    /// Server hostname from IRODS_HTTP_TEST_SERVER_HOSTNAME
    pub server_hostname: Option<String>,
    /// Log level from IRODS_HTTP_TEST_LOG_LEVEL
    pub log_level: Option<String>,
    /// Config file from IRODS_HTTP_TEST_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            host: get_env("HOST"),
            port: get_env_parse("PORT"),
            url_base: get_env("URL_BASE"),
            zone: get_env("ZONE"),
            admin_username: get_env("ADMIN_USERNAME"),
            admin_password: get_env("ADMIN_PASSWORD"),
            user_username: get_env("USER_USERNAME"),
            user_password: get_env("USER_PASSWORD"),
            run_genquery2_tests: get_env_bool("RUN_GENQUERY2_TESTS"),
            server_hostname: get_env("SERVER_HOSTNAME"),
            log_level: get_env("LOG_LEVEL"),
            config_file: get_env("CONFIG").filter(|v| !v.trim().is_empty()),
        }
    }

    /// Check if any override is set
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }

    /// Overwrite the fields whose variables are set
    ///
    /// Returns the names of the overridden fields.
    pub fn apply(&self, config: &mut TestConfig) -> Vec<&'static str> {
        let mut applied = Vec::new();
        let mut record = |name: &'static str, changed: bool| {
            if changed {
                applied.push(name);
            }
        };

        record("host", set_from(&mut config.host, &self.host));
        record("port", set_from(&mut config.port, &self.port));
        record("url_base", set_from(&mut config.url_base, &self.url_base));
        record("irods_zone", set_from(&mut config.irods_zone, &self.zone));
        record(
            "rodsadmin.username",
            set_from(&mut config.rodsadmin.username, &self.admin_username),
        );
        record(
            "rodsadmin.password",
            set_from(&mut config.rodsadmin.password, &self.admin_password),
        );
        record(
            "rodsuser.username",
            set_from(&mut config.rodsuser.username, &self.user_username),
        );
        record(
            "rodsuser.password",
            set_from(&mut config.rodsuser.password, &self.user_password),
        );
        record(
            "run_genquery2_tests",
            set_from(&mut config.run_genquery2_tests, &self.run_genquery2_tests),
        );

        if self.server_hostname.is_some() {
            config.irods_server_hostname = self.server_hostname.clone();
            record("irods_server_hostname", true);
        }
        if self.log_level.is_some() {
            config.log_level = self.log_level.clone();
            record("log_level", true);
        }

        applied
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        let masked = |v: &Option<String>| v.as_deref().map(mask);

        println!("Environment Configuration:");
        println!("  {ENV_PREFIX}_HOST:                {:?}", self.host);
        println!("  {ENV_PREFIX}_PORT:                {:?}", self.port);
        println!("  {ENV_PREFIX}_URL_BASE:            {:?}", self.url_base);
        println!("  {ENV_PREFIX}_ZONE:                {:?}", self.zone);
        println!("  {ENV_PREFIX}_ADMIN_USERNAME:      {:?}", self.admin_username);
        println!("  {ENV_PREFIX}_ADMIN_PASSWORD:      {:?}", masked(&self.admin_password));
        println!("  {ENV_PREFIX}_USER_USERNAME:       {:?}", self.user_username);
        println!("  {ENV_PREFIX}_USER_PASSWORD:       {:?}", masked(&self.user_password));
        println!("  {ENV_PREFIX}_RUN_GENQUERY2_TESTS: {:?}", self.run_genquery2_tests);
        println!("  {ENV_PREFIX}_SERVER_HOSTNAME:     {:?}", self.server_hostname);
        println!("  {ENV_PREFIX}_LOG_LEVEL:           {:?}", self.log_level);
        println!("  {ENV_PREFIX}_CONFIG:              {:?}", self.config_file);
    }
}

fn set_from<T: Clone>(field: &mut T, value: &Option<T>) -> bool {
    match value {
        Some(value) => {
            *field = value.clone();
            true
        }
        None => false,
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all IRODS_HTTP_TEST environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_HOST                 HTTP API hostname");
    println!("  {ENV_PREFIX}_PORT                 HTTP API port");
    println!("  {ENV_PREFIX}_URL_BASE             API path prefix (e.g. /irods-http-api/0.1.0)");
    println!("  {ENV_PREFIX}_ZONE                 iRODS zone name");
    println!("  {ENV_PREFIX}_ADMIN_USERNAME       rodsadmin username");
    println!("  {ENV_PREFIX}_ADMIN_PASSWORD       rodsadmin password");
    println!("  {ENV_PREFIX}_USER_USERNAME        rodsuser username");
    println!("  {ENV_PREFIX}_USER_PASSWORD        rodsuser password");
    println!("  {ENV_PREFIX}_RUN_GENQUERY2_TESTS  Enable GenQuery2 tests (true/false)");
    println!("  {ENV_PREFIX}_SERVER_HOSTNAME      Hostname of the iRODS server");
    println!("  {ENV_PREFIX}_LOG_LEVEL            Log level (trace, debug, info, warn, error, critical or 10-50)");
    println!("  {ENV_PREFIX}_CONFIG               Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_HOST=irods.example.org");
    println!("  export {ENV_PREFIX}_RUN_GENQUERY2_TESTS=true");
    println!("  irods-http-test config show");
}

/// Serialises tests that mutate the process environment
#[cfg(test)]
pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Set `IRODS_HTTP_TEST_{name}`
    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
