//! Downstream bandwidth measurement over HTTP
//!
//! Downloads a fixed-size payload from a known endpoint, times the transfer
//! from request start to stream completion, and converts the result into a
//! classified [`BandwidthSample`]. Success is judged purely by response
//! status and stream completion, never by content.

use crate::{
    error::{AppError, Result},
    probes::BandwidthProbe,
    types::BandwidthSample,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Smallest elapsed interval we trust as a measurement.
///
/// Anything faster is below wall-clock resolution for a transfer of this
/// size and would produce an absurd or divide-by-zero rate.
const MIN_MEASURABLE_ELAPSED: Duration = Duration::from_millis(1);

/// Compute throughput in megabits per second for a payload of `payload_bytes`
/// transferred in `elapsed`.
///
/// Fails when `elapsed` is below [`MIN_MEASURABLE_ELAPSED`].
pub fn compute_mbps(payload_bytes: u64, elapsed: Duration) -> Result<f64> {
    if elapsed < MIN_MEASURABLE_ELAPSED {
        return Err(AppError::probe(format!(
            "transfer of {} bytes completed in {:?}, below measurable resolution",
            payload_bytes, elapsed
        )));
    }
    let megabytes = payload_bytes as f64 / 1_000_000.0;
    Ok((megabytes / elapsed.as_secs_f64()) * 8.0)
}

/// Bandwidth probe that downloads a byte stream from an HTTP endpoint
pub struct HttpBandwidthProbe {
    client: Client,
    endpoint: String,
    payload_bytes: u64,
}

impl HttpBandwidthProbe {
    /// Create a probe against `endpoint`, expecting a `payload_bytes`-sized body
    pub fn new(endpoint: &str, payload_bytes: u64, timeout: Duration) -> Result<Self> {
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
            payload_bytes,
        })
    }
}

#[async_trait]
impl BandwidthProbe for HttpBandwidthProbe {
    async fn measure(&self) -> Result<BandwidthSample> {
        let started = Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| AppError::probe(format!("download request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::probe(format!(
                "bandwidth endpoint returned HTTP {}",
                status
            )));
        }

        // Drain the body chunk by chunk; the timer stops when the stream ends
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| AppError::probe(format!("download interrupted: {}", e)))?;
            received += chunk.len() as u64;
        }

        let elapsed = started.elapsed();
        let mbps = compute_mbps(self.payload_bytes, elapsed)?;

        if received != self.payload_bytes {
            // Short bodies still complete the stream; keep the figure but
            // base it on what actually arrived so it stays honest
            return Ok(BandwidthSample::new(compute_mbps(received, elapsed)?));
        }

        Ok(BandwidthSample::new(mbps))
    }
}
