//! Command-line interface module

use clap::Parser;

/// Network Diagnostic Orchestrator - geolocation, bandwidth and port checks in one report
#[derive(Parser, Debug, Clone)]
#[command(name = "netdiag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target host: IPv4/IPv6 literal or hostname
    pub address: String,

    /// TCP port to probe on the target host
    #[arg(short, long)]
    pub port: Option<u16>,

    /// API token for the geolocation provider
    #[arg(long, env = "NETDIAG_GEO_TOKEN", hide_env_values = true)]
    pub geo_token: Option<String>,

    /// Base URL of the geolocation provider
    #[arg(long, env = "NETDIAG_GEO_URL", default_value = crate::defaults::DEFAULT_GEO_BASE_URL)]
    pub geo_url: String,

    /// URL serving the fixed-size bandwidth payload
    #[arg(long, env = "NETDIAG_BANDWIDTH_URL", default_value = crate::defaults::DEFAULT_BANDWIDTH_URL)]
    pub bandwidth_url: String,

    /// Nominal size in bytes of the bandwidth payload
    #[arg(long, default_value_t = crate::defaults::DEFAULT_BANDWIDTH_PAYLOAD_BYTES)]
    pub bandwidth_payload_bytes: u64,

    /// URL of the HTTP port-checking service
    #[arg(long, env = "NETDIAG_PORT_CHECK_URL", default_value = crate::defaults::DEFAULT_PORT_CHECK_URL)]
    pub port_check_url: String,

    /// Probe the port with a direct TCP connect instead of the HTTP service
    #[arg(long, requires = "port")]
    pub direct: bool,

    /// Timeout per outbound call in seconds
    #[arg(short, long, default_value_t = crate::defaults::DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting color flags
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if self.address.trim().is_empty() {
            return Err("Address must not be empty".to_string());
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true // Force color output when --color is specified
        } else if self.no_color {
            false // Disable color output when --no-color is specified
        } else {
            supports_color() // Use automatic detection
        }
    }
}

/// Detect whether the current environment supports colored output
fn supports_color() -> bool {
    // Check for common environment variables that indicate color support
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    // Check for NO_COLOR environment variable
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check for FORCE_COLOR environment variable
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    true
}
