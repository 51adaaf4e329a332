//! Configuration loading and validation
//!
//! Combines CLI arguments with environment variables (including a `.env`
//! file via dotenv) into one validated [`Config`]. The geolocation API
//! token is injected configuration: it comes from `--geo-token` or
//! `NETDIAG_GEO_TOKEN`, never from a source literal.

use crate::{
    cli::Cli,
    error::{AppError, Result},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target host: IPv4/IPv6 literal or hostname
    pub address: String,
    /// TCP port to probe; `None` skips the port step
    pub port: Option<u16>,
    /// Base URL of the ipinfo.io-compatible geolocation provider
    pub geo_base_url: String,
    /// API token for the geolocation provider
    pub geo_token: String,
    /// URL of the fixed-size bandwidth payload
    pub bandwidth_url: String,
    /// Nominal payload size in bytes served by `bandwidth_url`
    pub bandwidth_payload_bytes: u64,
    /// URL of the HTTP port-checking service
    pub port_check_url: String,
    /// Probe ports with a direct TCP connect instead of the HTTP service
    pub direct_port_probe: bool,
    /// Timeout for each outbound call, in seconds
    pub timeout_seconds: u64,
    /// Emit the report as JSON instead of formatted text
    pub json_output: bool,
    /// Enable verbose output
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
    /// Enable colored console output
    pub enable_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: None,
            geo_base_url: crate::defaults::DEFAULT_GEO_BASE_URL.to_string(),
            geo_token: String::new(),
            bandwidth_url: crate::defaults::DEFAULT_BANDWIDTH_URL.to_string(),
            bandwidth_payload_bytes: crate::defaults::DEFAULT_BANDWIDTH_PAYLOAD_BYTES,
            port_check_url: crate::defaults::DEFAULT_PORT_CHECK_URL.to_string(),
            direct_port_probe: false,
            timeout_seconds: crate::defaults::DEFAULT_TIMEOUT.as_secs(),
            json_output: false,
            verbose: false,
            debug: false,
            enable_color: crate::defaults::DEFAULT_ENABLE_COLOR,
        }
    }
}

impl Config {
    /// Per-call timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// A non-fatal configuration concern worth surfacing to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub message: String,
}

impl ValidationWarning {
    fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Format the warning for console display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            format!("{} {}", "warning:".yellow().bold(), self.message)
        } else {
            format!("warning: {}", self.message)
        }
    }
}

/// Build the configuration from parsed CLI arguments.
///
/// Clap has already merged environment variables for flags that declare an
/// `env` fallback; this only maps the result into `Config` and validates it.
pub fn load_config(cli: Cli) -> Result<Config> {
    let config = Config {
        address: cli.address.clone(),
        port: cli.port,
        geo_base_url: cli.geo_url.clone(),
        geo_token: cli.geo_token.clone().unwrap_or_default(),
        bandwidth_url: cli.bandwidth_url.clone(),
        bandwidth_payload_bytes: cli.bandwidth_payload_bytes,
        port_check_url: cli.port_check_url.clone(),
        direct_port_probe: cli.direct,
        timeout_seconds: cli.timeout,
        json_output: cli.json,
        verbose: cli.verbose,
        debug: cli.debug,
        enable_color: cli.use_colors(),
    };

    validate_endpoints(&config)?;

    if config.timeout_seconds == 0 {
        return Err(AppError::config("timeout must be at least 1 second"));
    }
    if config.bandwidth_payload_bytes == 0 {
        return Err(AppError::config(
            "bandwidth payload size must be non-zero",
        ));
    }

    Ok(config)
}

/// Check that every configured endpoint is a well-formed http(s) URL
fn validate_endpoints(config: &Config) -> Result<()> {
    for (name, value) in [
        ("geolocation base URL", &config.geo_base_url),
        ("bandwidth URL", &config.bandwidth_url),
        ("port check URL", &config.port_check_url),
    ] {
        let parsed = Url::parse(value)
            .map_err(|e| AppError::config(format!("invalid {}: {}", name, e)))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::config(format!(
                    "invalid {}: unsupported scheme '{}'",
                    name, scheme
                )))
            }
        }
        if parsed.host().is_none() {
            return Err(AppError::config(format!("invalid {}: missing host", name)));
        }
    }
    Ok(())
}

/// Validate a loaded configuration, returning non-fatal warnings
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    let mut warnings = Vec::new();

    if config.geo_token.is_empty() {
        warnings.push(ValidationWarning::new(
            "no geolocation API token configured; the provider may reject or rate-limit lookups \
             (set --geo-token or NETDIAG_GEO_TOKEN)",
        ));
    }

    if config.bandwidth_payload_bytes < 1_000_000 {
        warnings.push(ValidationWarning::new(format!(
            "bandwidth payload of {} bytes is small; the measurement will be coarse",
            config.bandwidth_payload_bytes
        )));
    }

    if config.timeout_seconds < 3 {
        warnings.push(ValidationWarning::new(format!(
            "a {}s timeout may be too tight for the bandwidth download",
            config.timeout_seconds
        )));
    }

    Ok(warnings)
}

/// Render a human-readable configuration summary for debug output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = String::new();
    summary.push_str(&format!("  Target address: {}\n", config.address));
    summary.push_str(&format!(
        "  Port probe: {}\n",
        match config.port {
            Some(port) if config.direct_port_probe => format!("{} (direct TCP connect)", port),
            Some(port) => format!("{} (via {})", port, config.port_check_url),
            None => "disabled".to_string(),
        }
    ));
    summary.push_str(&format!("  Geolocation provider: {}\n", config.geo_base_url));
    summary.push_str(&format!(
        "  Geolocation token: {}\n",
        if config.geo_token.is_empty() {
            "(not set)"
        } else {
            "(set)"
        }
    ));
    summary.push_str(&format!(
        "  Bandwidth endpoint: {} ({} bytes)\n",
        config.bandwidth_url, config.bandwidth_payload_bytes
    ));
    summary.push_str(&format!("  Timeout: {}s\n", config.timeout_seconds));
    summary.push_str(&format!("  Output: {}", if config.json_output { "json" } else { "text" }));
    summary
}
