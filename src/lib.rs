//! Network Diagnostic Orchestrator
//!
//! Consolidates three network probes into one diagnostic report: IP
//! geolocation metadata, downstream bandwidth measurement, and TCP port
//! reachability. Each probe is failure-isolated; the report carries
//! whatever completed plus a per-step error list.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod probes;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use orchestrator::DiagnosticOrchestrator;
pub use output::{ColoredFormatter, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use probes::{
    BandwidthProbe, GeoLookup, HttpBandwidthProbe, HttpPortChecker, IpinfoClient, PortProbe,
    TcpConnectProbe,
};
pub use types::{
    AddressClassification, BandwidthSample, BandwidthTier, DiagnosticReport, DiagnosticRequest,
    GeoRecord, PortResult, PortState, ProbeStep, StepError,
};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_GEO_BASE_URL: &str = "https://ipinfo.io";
    pub const DEFAULT_BANDWIDTH_URL: &str = "https://speed.cloudflare.com/__down?bytes=10000000";
    pub const DEFAULT_BANDWIDTH_PAYLOAD_BYTES: u64 = 10_000_000;
    pub const DEFAULT_PORT_CHECK_URL: &str = "https://portchecker.io/api/query";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
