///! Map data for the land rendering path
///!
///! - `style`: immutable theme (layer tag rules, per-layer fill/stroke/hatch)
///! - `overpass`: map data source querying OSM ways around a point
///! - `projection`: lat/lon to canvas coordinates

pub mod style;
pub mod overpass;
pub mod projection;

pub use style::{Layer, LayerRule, LayerStyle, LayerStyles, MapStyle};
pub use overpass::{MapFeature, MapSource, OverpassClient};
pub use projection::LocalProjection;
