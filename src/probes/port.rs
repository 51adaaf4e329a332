//! TCP port reachability probes
//!
//! Two interchangeable implementations of [`PortProbe`]: one that asks an
//! external port-checking HTTP service, and one that performs a direct TCP
//! connection attempt. Both distinguish a refused connection (a normal
//! `Closed` outcome) from a failure to complete the probe at all.

use crate::{
    error::{AppError, Result},
    probes::PortProbe,
    types::{PortResult, PortState},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};

/// Request body sent to a portchecker-style HTTP service
#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    ip: &'a str,
    port: u16,
}

/// Response body from a portchecker-style HTTP service
#[derive(Debug, Deserialize)]
struct CheckResponse {
    open: bool,
}

/// Port probe that delegates to an external HTTP port-checking service
pub struct HttpPortChecker {
    client: Client,
    endpoint: String,
}

impl HttpPortChecker {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl PortProbe for HttpPortChecker {
    async fn probe(&self, address: &str, port: u16) -> Result<PortResult> {
        let body = CheckRequest { ip: address, port };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::network(format!("port check request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::network(format!(
                "port check service returned HTTP {}",
                status
            )));
        }

        let parsed: CheckResponse = response
            .json()
            .await
            .map_err(|e| AppError::parse(format!("malformed port check response: {}", e)))?;

        let state = if parsed.open {
            PortState::Open
        } else {
            PortState::Closed
        };
        Ok(PortResult::new(port, state))
    }
}

/// Port probe that attempts a direct TCP connection with a bounded timeout
pub struct TcpConnectProbe {
    connect_timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Render `address:port` as a resolvable target, bracketing IPv6 literals
    fn target(address: &str, port: u16) -> String {
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("[{}]:{}", v6, port),
            _ => format!("{}:{}", address, port),
        }
    }
}

#[async_trait]
impl PortProbe for TcpConnectProbe {
    async fn probe(&self, address: &str, port: u16) -> Result<PortResult> {
        let target = Self::target(address, port);

        // DNS failure means the probe could not be completed, not "closed"
        let mut resolved = lookup_host(&target)
            .await
            .map_err(|e| AppError::network(format!("DNS resolution failed for {}: {}", address, e)))?;
        let addr = resolved
            .next()
            .ok_or_else(|| AppError::network(format!("no addresses resolved for {}", address)))?;

        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Ok(PortResult::new(port, PortState::Open)),
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                Ok(PortResult::new(port, PortState::Closed))
            }
            Ok(Err(e)) => Err(AppError::network(format!(
                "connect to {} failed: {}",
                target, e
            ))),
            Err(_) => Err(AppError::timeout(format!(
                "port probe to {} timed out after {:?}",
                target, self.connect_timeout
            ))),
        }
    }
}
