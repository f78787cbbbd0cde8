///! Local planar projection centred on the ISS ground point

use crate::model::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Equirectangular projection around a centre point.
///
/// Good enough for the few tens of kilometres a map covers. Longitude
/// differences are wrapped so maps across the antimeridian stay contiguous.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    center: Coordinate,
    cos_lat: f64,
    radius_m: f64,
    /// Canvas units per metre
    scale: f64,
    origin: (f64, f64),
}

impl LocalProjection {
    /// `radius_m` metres around `center` map onto `canvas_radius` units around `origin`
    pub fn new(center: Coordinate, radius_m: f64, origin: (f32, f32), canvas_radius: f32) -> Self {
        let radius_m = if radius_m > 0.0 { radius_m } else { 1.0 };
        Self {
            center,
            cos_lat: center.latitude().to_radians().cos(),
            radius_m,
            scale: canvas_radius as f64 / radius_m,
            origin: (origin.0 as f64, origin.1 as f64),
        }
    }

    /// East / north offset from the centre, in metres
    pub fn offset_m(&self, lat: f64, lon: f64) -> (f64, f64) {
        let mut dlon = lon - self.center.longitude();
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        let dlat = lat - self.center.latitude();
        (
            dlon.to_radians() * self.cos_lat * EARTH_RADIUS_M,
            dlat.to_radians() * EARTH_RADIUS_M,
        )
    }

    /// Whether the bounding box of `points` touches the map circle
    pub fn reaches(&self, points: &[(f64, f64)]) -> bool {
        let mut offsets = points.iter().map(|(lat, lon)| self.offset_m(*lat, *lon));
        let Some((east, north)) = offsets.next() else {
            return false;
        };
        let (min_e, max_e, min_n, max_n) = offsets.fold(
            (east, east, north, north),
            |(min_e, max_e, min_n, max_n), (e, n)| (min_e.min(e), max_e.max(e), min_n.min(n), max_n.max(n)),
        );
        // closest point of the box to the centre
        let dx = 0.0_f64.clamp(min_e, max_e);
        let dy = 0.0_f64.clamp(min_n, max_n);
        dx.hypot(dy) <= self.radius_m
    }

    /// Canvas position, y growing downwards
    pub fn project(&self, lat: f64, lon: f64) -> (f32, f32) {
        let (east, north) = self.offset_m(lat, lon);
        (
            (self.origin.0 + east * self.scale) as f32,
            (self.origin.1 - north * self.scale) as f32,
        )
    }
}
