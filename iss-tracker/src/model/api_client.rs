///! open-notify client for the ISS position and the people currently in space

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::types::{Coordinate, CrewMember, CrewRoster};
use crate::config::ApiConfig;
use crate::error::{TrackerError, TrackerResult};

/// Where the pipeline gets the ISS position and crew from
#[async_trait]
pub trait IssDataSource: Send + Sync {
    async fn fetch_position(&self) -> TrackerResult<Coordinate>;
    async fn fetch_crew(&self) -> TrackerResult<CrewRoster>;
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    iss_position: RawPosition,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    latitude: Degrees,
    longitude: Degrees,
}

/// The API sends degrees as strings; plain numbers are accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn value(&self, field: &str) -> Result<f64, String> {
        match self {
            Degrees::Number(v) => Ok(*v),
            Degrees::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("{} is not a number: {:?}", field, s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AstrosResponse {
    people: Vec<CrewMember>,
}

/// Parse the `iss-now` payload into a [`Coordinate`]
pub fn parse_position_json(json: &str) -> Result<Coordinate, String> {
    let resp: PositionResponse = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let latitude = resp.iss_position.latitude.value("latitude")?;
    let longitude = resp.iss_position.longitude.value("longitude")?;
    Coordinate::new(latitude, longitude)
}

/// Parse the `astros` payload and group the people by craft
pub fn parse_crew_json(json: &str) -> Result<CrewRoster, String> {
    let resp: AstrosResponse = serde_json::from_str(json).map_err(|e| e.to_string())?;
    Ok(resp.people.iter().collect())
}

pub struct OpenNotifyClient {
    client: Client,
    position_url: String,
    astros_url: String,
}

impl OpenNotifyClient {
    pub fn new(config: &ApiConfig) -> TrackerResult<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.fetch_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TrackerError::network(&config.position_url, e))?;

        Ok(Self {
            client,
            position_url: config.position_url.clone(),
            astros_url: config.astros_url.clone(),
        })
    }
}

#[async_trait]
impl IssDataSource for OpenNotifyClient {
    async fn fetch_position(&self) -> TrackerResult<Coordinate> {
        tracing::info!("Fetching ISS position from {}", self.position_url);

        let body = self
            .client
            .get(&self.position_url)
            .send()
            .await
            .map_err(|e| TrackerError::network(&self.position_url, e))?
            .text()
            .await
            .map_err(|e| TrackerError::network(&self.position_url, e))?;

        let coordinate = parse_position_json(&body)
            .map_err(|reason| TrackerError::malformed(&self.position_url, reason))?;

        tracing::info!("ISS is at {}", coordinate);
        Ok(coordinate)
    }

    async fn fetch_crew(&self) -> TrackerResult<CrewRoster> {
        tracing::info!("Fetching people in space from {}", self.astros_url);

        let response = self
            .client
            .get(&self.astros_url)
            .send()
            .await
            .map_err(|e| TrackerError::network(&self.astros_url, e))?;

        if !response.status().is_success() {
            return Err(TrackerError::Upstream {
                url: self.astros_url.clone(),
                status: response.status(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::network(&self.astros_url, e))?;

        let roster = parse_crew_json(&body)
            .map_err(|reason| TrackerError::malformed(&self.astros_url, reason))?;

        tracing::info!("{} people in space across {} crafts", roster.total(), roster.len());
        for (craft, names) in roster.crafts() {
            tracing::debug!("{}: {}", craft, names.join(", "));
        }
        Ok(roster)
    }
}
