pub mod types;
pub mod api_client;
pub mod geocode;
pub mod classifier;
#[cfg(test)]
mod http_stub;

pub use types::{
    Coordinate, CrewMember, CrewRoster, GeocodeResult, LocationClassification, RenderedScene, Scene,
};
pub use api_client::{IssDataSource, OpenNotifyClient};
pub use geocode::{NominatimClient, ReverseGeocoder};
pub use classifier::{OceanClassifier, classify_address};
