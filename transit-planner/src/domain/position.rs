//! Geographic positions.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLong {
    pub lat: f64,
    pub lon: f64,
}

impl LatLong {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in metres (haversine).
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_planner::domain::LatLong;
    ///
    /// let a = LatLong::new(53.4794, -2.2453);
    /// assert_eq!(a.distance_m(&a), 0.0);
    /// ```
    pub fn distance_m(&self, other: &LatLong) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }
}
