//! Preflight checks against the configured server
//!
//! Verifies, without credentials, that the HTTP API answers at the
//! configured URL base and serves the configured zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::TestConfig;
use crate::http::{HttpClient, HttpError, HttpResponse};

/// Body of `GET {url_base}/info`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub api_version: String,
    pub build: String,
    pub irods_zone: String,
}

/// Single preflight check
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreflightCheck {
    /// Check name
    pub name: String,

    /// Whether check passed
    pub passed: bool,

    /// Result message
    pub message: String,
}

impl PreflightCheck {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            message: message.into(),
        }
    }

    fn skipped(name: &str, after: &str) -> Self {
        Self::fail(name, format!("skipped: {after} check failed"))
    }
}

/// Aggregate preflight result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreflightReport {
    /// URL that was probed
    pub url: String,

    /// Overall health
    pub healthy: bool,

    pub checks: Vec<PreflightCheck>,

    /// Server information, when the info document parsed
    pub server: Option<ServerInfo>,

    pub checked_at: DateTime<Utc>,
}

impl PreflightReport {
    fn new(url: String, checks: Vec<PreflightCheck>, server: Option<ServerInfo>) -> Self {
        Self {
            url,
            healthy: checks.iter().all(|c| c.passed),
            checks,
            server,
            checked_at: Utc::now(),
        }
    }

    /// Format as table
    pub fn format_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nPreflight: {}\n", self.url));
        output.push_str(&format!("{:-<60}\n", ""));

        for check in &self.checks {
            let icon = if check.passed { "✓" } else { "✗" };
            output.push_str(&format!("  {icon} {:14} {}\n", check.name, check.message));
        }

        output.push_str(&format!("{:-<60}\n", ""));
        if let Some(server) = &self.server {
            output.push_str(&format!(
                "  API version: {}  build: {}\n",
                server.api_version, server.build
            ));
        }
        output.push_str(&format!(
            "  Status: {}  ({})\n",
            if self.healthy { "✓ Ready" } else { "✗ Not ready" },
            self.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output
    }
}

/// Runs the preflight checks
pub struct PreflightChecker {
    http_client: HttpClient,
}

impl PreflightChecker {
    pub fn new(timeout_secs: u64) -> Result<Self, HttpError> {
        Ok(Self {
            http_client: HttpClient::with_timeout(timeout_secs)?,
        })
    }

    /// Probe `{base_url}/info` and compare it with the configuration
    pub async fn run(&self, config: &TestConfig) -> PreflightReport {
        let url = config.endpoint_url("info");
        info!(
            "Running preflight checks against {} (timeout {}s)",
            url,
            self.http_client.timeout_secs()
        );

        let result = self.http_client.get(&url).await;
        let report = evaluate(config, url, result);

        if report.healthy {
            info!("Preflight checks passed");
        } else {
            warn!(
                "{}/{} preflight checks failed",
                report.checks.iter().filter(|c| !c.passed).count(),
                report.checks.len()
            );
        }

        report
    }
}

/// Turn the outcome of the info request into a report
pub fn evaluate(
    config: &TestConfig,
    url: String,
    result: Result<HttpResponse, HttpError>,
) -> PreflightReport {
    let mut checks = Vec::new();

    let response = match result {
        Ok(response) => {
            checks.push(PreflightCheck::pass(
                "reachable",
                format!("responded in {}ms", response.duration_ms),
            ));
            response
        }
        Err(e) => {
            checks.push(PreflightCheck::fail("reachable", e.to_string()));
            checks.push(PreflightCheck::skipped("status", "reachable"));
            checks.push(PreflightCheck::skipped("info_document", "reachable"));
            checks.push(PreflightCheck::skipped("zone", "reachable"));
            return PreflightReport::new(url, checks, None);
        }
    };

    debug!(
        "Info response content-type: {:?}",
        response.get_header("content-type")
    );

    if response.status_code != 200 {
        checks.push(PreflightCheck::fail(
            "status",
            format!("expected HTTP 200, got {}", response.status_code),
        ));
        checks.push(PreflightCheck::skipped("info_document", "status"));
        checks.push(PreflightCheck::skipped("zone", "status"));
        return PreflightReport::new(url, checks, None);
    }
    checks.push(PreflightCheck::pass("status", "HTTP 200"));

    let server: ServerInfo = match serde_json::from_str(&response.body) {
        Ok(server) => server,
        Err(e) => {
            checks.push(PreflightCheck::fail(
                "info_document",
                format!("unexpected info document: {e}"),
            ));
            checks.push(PreflightCheck::skipped("zone", "info_document"));
            return PreflightReport::new(url, checks, None);
        }
    };
    checks.push(PreflightCheck::pass(
        "info_document",
        format!("api_version {}", server.api_version),
    ));

    if server.irods_zone == config.irods_zone {
        checks.push(PreflightCheck::pass(
            "zone",
            format!("server zone is {}", server.irods_zone),
        ));
    } else {
        checks.push(PreflightCheck::fail(
            "zone",
            format!(
                "server zone {} does not match configured irods_zone {}",
                server.irods_zone, config.irods_zone
            ),
        ));
    }

    PreflightReport::new(url, checks, Some(server))
}
