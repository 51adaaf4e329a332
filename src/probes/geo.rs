//! Geolocation lookup client for ipinfo.io-compatible providers
//!
//! The provider's wire schema stays private to this module; callers only
//! ever see the normalized [`GeoRecord`].

use crate::{
    error::{AppError, Result},
    probes::GeoLookup,
    types::{AddressClassification, GeoRecord, UNKNOWN_HOSTNAME},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Wire response from an ipinfo.io-compatible endpoint.
///
/// Every field is optional: the provider omits keys it has no data for, and
/// error responses can arrive with a success status carrying only `error`.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    org: Option<String>,
    hostname: Option<String>,
    bogon: Option<bool>,
    error: Option<serde_json::Value>,
}

/// HTTP client for an ipinfo.io-compatible geolocation provider
pub struct IpinfoClient {
    client: Client,
    base_url: String,
    token: String,
}

impl IpinfoClient {
    /// Create a new client.
    ///
    /// `token` is the caller-supplied API credential; it is sent as a query
    /// parameter and never baked into the binary.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
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
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Normalize the provider payload into a `GeoRecord`
    fn normalize(&self, address: &str, response: ProviderResponse) -> GeoRecord {
        GeoRecord {
            address: response.ip.unwrap_or_else(|| address.to_string()),
            city: response.city.unwrap_or_default(),
            region: response.region.unwrap_or_default(),
            country: response.country.unwrap_or_default(),
            organization: response.org.unwrap_or_default(),
            hostname: response
                .hostname
                .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string()),
            classification: AddressClassification::from_bogon(response.bogon.unwrap_or(false)),
        }
    }
}

#[async_trait]
impl GeoLookup for IpinfoClient {
    async fn lookup(&self, address: &str) -> Result<GeoRecord> {
        let url = format!("{}/{}?token={}", self.base_url, address, self.token);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::lookup(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::lookup(format!(
                "provider returned HTTP {}",
                status
            )));
        }

        let parsed: ProviderResponse = response
            .json()
            .await
            .map_err(|e| AppError::lookup(format!("malformed provider response: {}", e)))?;

        // Providers report per-address errors inside a success-status body
        if let Some(error) = parsed.error {
            return Err(AppError::lookup(format!(
                "provider error for {}: {}",
                address, error
            )));
        }

        Ok(self.normalize(address, parsed))
    }
}
