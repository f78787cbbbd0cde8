///! Map data source backed by the Overpass API
///!
///! Builds one Overpass QL query out of the layer rules of a [`MapStyle`],
///! fetches every matching way around the ISS ground point with its geometry,
///! and sorts the ways into thematic layers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

use super::style::{Layer, MapStyle};
use crate::error::{TrackerError, TrackerResult};
use crate::model::Coordinate;

/// One OSM way sorted into a layer
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub id: u64,
    pub layer: Layer,
    pub tags: HashMap<String, String>,
    /// `(lat, lon)` vertices
    pub points: Vec<(f64, f64)>,
}

impl MapFeature {
    /// Closed ring (first vertex repeated at the end)
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 4 && self.points.first() == self.points.last()
    }
}

/// Provider of map features around a point
#[async_trait]
pub trait MapSource: Send + Sync {
    async fn features(
        &self,
        center: Coordinate,
        radius_m: f64,
        style: &MapStyle,
    ) -> TrackerResult<Vec<MapFeature>>;
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<RawElement>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

fn value_alternation(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.replace('\\', "\\\\").replace('"', "\\\""))
        .collect::<Vec<_>>()
        .join("|")
}

fn tag_filter(key: &str, values: &[String]) -> String {
    if values.is_empty() {
        format!(r#"["{}"]"#, key)
    } else {
        format!(r#"["{}"~"^({})$"]"#, key, value_alternation(values))
    }
}

/// Overpass QL query for every layer of `style` within `radius_m` of `center`
pub fn build_query(center: Coordinate, radius_m: f64, style: &MapStyle, timeout_secs: u64) -> String {
    let around = format!(
        "(around:{:.0},{:.6},{:.6})",
        radius_m,
        center.latitude(),
        center.longitude()
    );

    let mut query = format!("[out:json][timeout:{}];\n(\n", timeout_secs);
    for rule in &style.layers {
        for (key, values) in &rule.tags {
            let _ = writeln!(query, "  way{}{};", tag_filter(key, values), around);
        }
    }
    if !style.street_widths.is_empty() {
        let classes: Vec<String> = style.street_widths.keys().cloned().collect();
        let _ = writeln!(query, "  way{}{};", tag_filter("highway", &classes), around);
    }
    let _ = writeln!(query, "  way{}{};", tag_filter("building", &[]), around);
    query.push_str(");\nout geom;\n");
    query
}

/// Parse an Overpass JSON answer into layered features.
///
/// Elements without geometry or without a matching layer are dropped.
pub fn parse_overpass_json(json: &str, style: &MapStyle) -> Result<Vec<MapFeature>, serde_json::Error> {
    let resp: OverpassResponse = serde_json::from_str(json)?;
    let total = resp.elements.len();

    let features: Vec<MapFeature> = resp
        .elements
        .into_iter()
        .filter(|el| el.kind == "way" && el.geometry.len() >= 2)
        .filter_map(|el| {
            let layer = style.layer_for(&el.tags)?;
            Some(MapFeature {
                id: el.id,
                layer,
                points: el.geometry.iter().map(|p| (p.lat, p.lon)).collect(),
                tags: el.tags,
            })
        })
        .collect();

    if features.len() < total {
        tracing::debug!("Dropped {} of {} map elements", total - features.len(), total);
    }

    Ok(features)
}

/// Overpass API client
pub struct OverpassClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl OverpassClient {
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
}

#[async_trait]
impl MapSource for OverpassClient {
    async fn features(
        &self,
        center: Coordinate,
        radius_m: f64,
        style: &MapStyle,
    ) -> TrackerResult<Vec<MapFeature>> {
        let query = build_query(center, radius_m, style, self.timeout_secs);
        tracing::info!("Querying map data within {:.0} m of {}", radius_m, center);
        tracing::debug!("Overpass query:\n{}", query);

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!("data={}", urlencoding::encode(&query)))
            .send()
            .await
            .map_err(|e| TrackerError::network(&self.url, e))?;

        if !response.status().is_success() {
            return Err(TrackerError::Upstream {
                url: self.url.clone(),
                status: response.status(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::network(&self.url, e))?;

        let features = parse_overpass_json(&body, style)
            .map_err(|e| TrackerError::malformed(&self.url, e.to_string()))?;

        tracing::info!("Received {} map features", features.len());
        Ok(features)
    }
}
