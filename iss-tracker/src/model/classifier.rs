///! Ocean / land classification from a reverse geocoded address

use std::sync::Arc;

use super::geocode::ReverseGeocoder;
use super::types::{Coordinate, GeocodeResult, LocationClassification};
use crate::error::TrackerResult;

const WATER_KEYWORDS: [&str; 2] = ["ocean", "sea"];

/// No address, or an address mentioning an ocean or a sea, means water.
///
/// Plain substring match on the lowercased address. Lakes, rivers and bays
/// are not recognised.
pub fn classify_address(address: Option<&str>) -> LocationClassification {
    match address {
        None => LocationClassification::Ocean,
        Some(address) => {
            let address = address.to_lowercase();
            if WATER_KEYWORDS.iter().any(|kw| address.contains(kw)) {
                LocationClassification::Ocean
            } else {
                LocationClassification::Land
            }
        }
    }
}

/// Classifies a coordinate with a single reverse geocoding lookup
#[derive(Clone)]
pub struct OceanClassifier {
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl OceanClassifier {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder }
    }

    /// Classification plus the address it came from
    pub async fn locate(&self, coordinate: Coordinate) -> TrackerResult<GeocodeResult> {
        let address = self.geocoder.reverse(coordinate).await?;
        let classification = classify_address(address.as_deref());
        tracing::info!("{} is over {}", coordinate, classification);
        Ok(GeocodeResult {
            classification,
            address,
        })
    }

    pub async fn classify(&self, coordinate: Coordinate) -> TrackerResult<LocationClassification> {
        Ok(self.locate(coordinate).await?.classification)
    }
}
