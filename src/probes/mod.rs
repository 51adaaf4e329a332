//! Probe contracts and implementations
//!
//! Each probe is a single outbound check with its own independent
//! success/failure outcome, behind an async trait so the orchestrator can be
//! tested against mocks and providers can be swapped without touching the
//! aggregation logic.

pub mod bandwidth;
pub mod geo;
pub mod port;

pub use bandwidth::HttpBandwidthProbe;
pub use geo::IpinfoClient;
pub use port::{HttpPortChecker, TcpConnectProbe};

use crate::{
    error::Result,
    types::{BandwidthSample, GeoRecord, PortResult},
};
use async_trait::async_trait;

/// Geolocation metadata lookup for a target address
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Look up identity/geolocation metadata for the given address.
    ///
    /// Fails on network errors, malformed responses, and provider-reported
    /// errors for the address.
    async fn lookup(&self, address: &str) -> Result<GeoRecord>;
}

/// Downstream bandwidth measurement for the caller's own network path
#[async_trait]
pub trait BandwidthProbe: Send + Sync {
    /// Download a fixed-size payload, time it and classify the throughput.
    ///
    /// Fails when the download cannot be completed: non-success status,
    /// connection error, timeout, or an elapsed interval too small to
    /// measure.
    async fn measure(&self) -> Result<BandwidthSample>;
}

/// TCP port reachability check against a target host
#[async_trait]
pub trait PortProbe: Send + Sync {
    /// Probe whether the given TCP port is reachable.
    ///
    /// A closed port is a normal outcome (`Ok` with `PortState::Closed`),
    /// never an error. An `Err` means the probe itself could not be
    /// completed (timeout, DNS failure, unreachable checking service); the
    /// orchestrator surfaces that as `PortState::ProbeFailed`.
    async fn probe(&self, address: &str, port: u16) -> Result<PortResult>;
}
