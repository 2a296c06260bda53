//! Great-circle distance on a spherical Earth.

use commons_types::Coordinate;

/// Mean Earth radius (IUGG), in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Haversine distance between two coordinates, in meters
///
/// Inputs are not validated; NaN in, NaN out.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    // clamp: rounding can push h a hair above 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}
