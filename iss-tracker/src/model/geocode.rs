///! Reverse geocoding through Nominatim

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::types::Coordinate;
use crate::error::{TrackerError, TrackerResult};

/// Looks up a human readable address for a coordinate
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// `Ok(None)` when the service knows no address for the point
    async fn reverse(&self, coordinate: Coordinate) -> TrackerResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract the address from a Nominatim `reverse` answer.
///
/// Nominatim answers points it cannot resolve (open water, mostly) with
/// `{"error": "Unable to geocode"}` and a 200 status.
pub fn parse_reverse_json(json: &str) -> Result<Option<String>, serde_json::Error> {
    let resp: ReverseResponse = serde_json::from_str(json)?;
    if let Some(error) = resp.error {
        tracing::debug!("Geocoder returned no address: {}", error);
        return Ok(None);
    }
    Ok(resp
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty()))
}

pub struct NominatimClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl NominatimClient {
    pub fn new(url: &str, user_agent: &str, timeout_secs: u64) -> TrackerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| TrackerError::network(url, e))?;

        Ok(Self {
            client,
            url: url.to_string(),
            timeout_secs,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> TrackerError {
        if e.is_timeout() {
            TrackerError::GeocodeTimeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            TrackerError::network(&self.url, e)
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, coordinate: Coordinate) -> TrackerResult<Option<String>> {
        tracing::info!("Reverse geocoding {}", coordinate);

        let lat = coordinate.latitude().to_string();
        let lon = coordinate.longitude().to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[("format", "jsonv2"), ("lat", lat.as_str()), ("lon", lon.as_str())])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(TrackerError::Upstream {
                url: self.url.clone(),
                status: response.status(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let address = parse_reverse_json(&body)
            .map_err(|e| TrackerError::malformed(&self.url, e.to_string()))?;

        match &address {
            Some(address) => tracing::info!("Getting address of {}", address),
            None => tracing::info!("No address found for {}", coordinate),
        }
        Ok(address)
    }
}
