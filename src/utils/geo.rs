//! Great-circle distance helpers.
//!
//! Uses the haversine formula on a spherical Earth.

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per statute mile.
pub const KM_PER_MILE: f64 = 1.60934;

/// Haversine distance in kilometers between two `(lat, lon)` points given in degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}
