//! Core data model for diagnostic runs
//!
//! This module defines the request/report types exchanged between the
//! orchestrator and its callers, plus the classification enums derived
//! from probe measurements. Reports are created fresh per run and are
//! immutable once returned; no diagnostic state is shared between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel used when the geolocation provider omits a hostname
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// A single diagnostic run request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRequest {
    /// Target host: IPv4/IPv6 literal or hostname
    pub address: String,
    /// TCP port to probe; when absent the port step is skipped entirely
    pub port: Option<u16>,
}

impl DiagnosticRequest {
    /// Create a request for an address without a port probe
    pub fn new<S: Into<String>>(address: S) -> Self {
        Self {
            address: address.into(),
            port: None,
        }
    }

    /// Create a request that includes a port probe
    pub fn with_port<S: Into<String>>(address: S, port: u16) -> Self {
        Self {
            address: address.into(),
            port: Some(port),
        }
    }
}

/// Routability classification derived from the provider's bogon flag
///
/// The upstream flag only distinguishes reserved/non-routable ranges from
/// everything else, so this is deliberately a two-state enum. Non-routable
/// addresses are not "invalid" - they are simply not globally routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressClassification {
    /// Reserved or private range (provider reported bogon = true)
    NonRoutable,
    /// Globally routable; possibly a dynamically assigned address
    PotentiallyDynamicPublic,
}

impl AddressClassification {
    /// Derive the classification from the provider's bogon flag
    pub fn from_bogon(bogon: bool) -> Self {
        if bogon {
            Self::NonRoutable
        } else {
            Self::PotentiallyDynamicPublic
        }
    }

    /// Human-readable label for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonRoutable => "non-routable (reserved/private)",
            Self::PotentiallyDynamicPublic => "potentially dynamic public",
        }
    }
}

/// Normalized geolocation metadata for an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub address: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub organization: String,
    /// Always populated; [`UNKNOWN_HOSTNAME`] when the provider omits it
    pub hostname: String,
    pub classification: AddressClassification,
}

/// Qualitative bandwidth bucket derived from a Mbps measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthTier {
    Poor,
    Moderate,
    Good,
}

impl BandwidthTier {
    /// Classify a throughput figure in megabits per second.
    ///
    /// Boundaries: below 20 is `Poor`, above 75 is `Good`, everything in
    /// between (20 and 75 included) is `Moderate`. These thresholds
    /// reproduce long-standing observed behavior; do not adjust them.
    pub fn from_mbps(mbps: f64) -> Self {
        if mbps < 20.0 {
            Self::Poor
        } else if mbps > 75.0 {
            Self::Good
        } else {
            Self::Moderate
        }
    }

    /// Label used in console output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poor => "poor",
            Self::Moderate => "moderate",
            Self::Good => "good",
        }
    }
}

/// One completed downstream bandwidth measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSample {
    /// Measured throughput in megabits per second
    pub mbps: f64,
    /// Qualitative bucket for the measurement
    pub tier: BandwidthTier,
    /// When the measurement completed
    pub measured_at: DateTime<Utc>,
}

impl BandwidthSample {
    /// Build a sample from a raw Mbps figure, classifying it as we go
    pub fn new(mbps: f64) -> Self {
        Self {
            mbps,
            tier: BandwidthTier::from_mbps(mbps),
            measured_at: Utc::now(),
        }
    }
}

/// Outcome of a TCP port reachability probe
///
/// `Closed` is a normal, successful probe outcome: the probe completed and
/// the port refused the connection. Only a failure to complete the probe
/// itself (timeout, DNS failure, unreachable checking service) yields
/// `ProbeFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Open,
    Closed,
    ProbeFailed,
}

impl PortState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::ProbeFailed => "probe failed",
        }
    }
}

/// Result of the port reachability step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    pub port: u16,
    pub state: PortState,
}

impl PortResult {
    pub fn new(port: u16, state: PortState) -> Self {
        Self { port, state }
    }
}

/// Identifies which probe produced a step-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStep {
    Geolocation,
    Bandwidth,
    PortCheck,
}

impl ProbeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geolocation => "geolocation",
            Self::Bandwidth => "bandwidth",
            Self::PortCheck => "port-check",
        }
    }
}

impl std::fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caught per-step failure, recorded in the aggregate report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub step: ProbeStep,
    pub message: String,
}

impl StepError {
    pub fn new<S: Into<String>>(step: ProbeStep, message: S) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Aggregate result of one diagnostic run
///
/// A field is `None` only when its step failed or (for `port`) was not
/// requested - never silently defaulted to values that look like real data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Correlation ID tying this report to its log events
    pub run_id: Uuid,
    pub geo: Option<GeoRecord>,
    pub bandwidth: Option<BandwidthSample>,
    pub port: Option<PortResult>,
    /// Per-step failures, in step order; never fails the run as a whole
    pub errors: Vec<StepError>,
}

impl DiagnosticReport {
    /// Create an empty report for a new run
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            geo: None,
            bandwidth: None,
            port: None,
            errors: Vec::new(),
        }
    }

    /// True when every applicable step completed without a step error
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(BandwidthTier::from_mbps(0.0), BandwidthTier::Poor);
        assert_eq!(BandwidthTier::from_mbps(19.99), BandwidthTier::Poor);
        assert_eq!(BandwidthTier::from_mbps(20.0), BandwidthTier::Moderate);
        assert_eq!(BandwidthTier::from_mbps(50.0), BandwidthTier::Moderate);
        assert_eq!(BandwidthTier::from_mbps(75.0), BandwidthTier::Moderate);
        assert_eq!(BandwidthTier::from_mbps(75.01), BandwidthTier::Good);
        assert_eq!(BandwidthTier::from_mbps(500.0), BandwidthTier::Good);
    }

    proptest! {
        #[test]
        fn test_tier_partition(v in 0.0f64..10_000.0) {
            let tier = BandwidthTier::from_mbps(v);
            if v < 20.0 {
                prop_assert_eq!(tier, BandwidthTier::Poor);
            } else if v > 75.0 {
                prop_assert_eq!(tier, BandwidthTier::Good);
            } else {
                prop_assert_eq!(tier, BandwidthTier::Moderate);
            }
        }
    }

    #[test]
    fn test_classification_from_bogon() {
        assert_eq!(
            AddressClassification::from_bogon(true),
            AddressClassification::NonRoutable
        );
        assert_eq!(
            AddressClassification::from_bogon(false),
            AddressClassification::PotentiallyDynamicPublic
        );
    }

    #[test]
    fn test_bandwidth_sample_classifies() {
        let sample = BandwidthSample::new(42.0);
        assert_eq!(sample.mbps, 42.0);
        assert_eq!(sample.tier, BandwidthTier::Moderate);
    }

    #[test]
    fn test_request_constructors() {
        let req = DiagnosticRequest::new("8.8.8.8");
        assert_eq!(req.address, "8.8.8.8");
        assert_eq!(req.port, None);

        let req = DiagnosticRequest::with_port("example.com", 443);
        assert_eq!(req.port, Some(443));
    }

    #[test]
    fn test_empty_report() {
        let report = DiagnosticReport::new(Uuid::new_v4());
        assert!(report.geo.is_none());
        assert!(report.bandwidth.is_none());
        assert!(report.port.is_none());
        assert!(report.is_complete());
    }

    #[test]
    fn test_report_serialization_round_trip() {
        let mut report = DiagnosticReport::new(Uuid::new_v4());
        report.bandwidth = Some(BandwidthSample::new(88.0));
        report.port = Some(PortResult::new(443, PortState::Open));
        report
            .errors
            .push(StepError::new(ProbeStep::Geolocation, "lookup failed"));

        let json = serde_json::to_string(&report).unwrap();
        let parsed: DiagnosticReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert!(!parsed.is_complete());
    }

    #[test]
    fn test_step_error_display() {
        let err = StepError::new(ProbeStep::Bandwidth, "download timed out");
        assert_eq!(err.to_string(), "bandwidth: download timed out");
    }
}
