use gpfinder_core::Coordinate;

/// Mean Earth radius in statute miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance between two points in miles (haversine formula).
#[must_use]
pub fn haversine_miles(from: Coordinate, to: Coordinate) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}
