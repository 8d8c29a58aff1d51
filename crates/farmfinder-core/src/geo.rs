//! Coordinate types and great-circle distance.
//!
//! Two axis orders are in play. Geocoders, maps and JSON output speak
//! latitude-first ([`DisplayPoint`]); the geo-indexed `point` column stores
//! longitude-first ([`StorePoint`], x = longitude, y = latitude). The types are
//! distinct so that a pair can only cross between the two through the `From`
//! conversions below.

use ::geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const METERS_PER_MILE: f64 = 1609.344;

/// A coordinate in (latitude, longitude) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A coordinate in storage order: (longitude, latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorePoint {
    pub lng: f64,
    pub lat: f64,
}

fn check_range(lat: f64, lng: f64) -> Result<(), CoreError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        Err(CoreError::InvalidCoordinate { lat, lng })
    }
}

impl DisplayPoint {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if either axis is out of range
    /// or not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoreError> {
        check_range(lat, lng)?;
        Ok(Self { lat, lng })
    }
}

impl StorePoint {
    /// Arguments are longitude first, matching the storage convention.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] if either axis is out of range
    /// or not finite.
    pub fn new(lng: f64, lat: f64) -> Result<Self, CoreError> {
        check_range(lat, lng)?;
        Ok(Self { lng, lat })
    }

    /// `(x, y)` as written to a Postgres `point`.
    #[must_use]
    pub fn xy(self) -> (f64, f64) {
        (self.lng, self.lat)
    }
}

impl From<DisplayPoint> for StorePoint {
    fn from(p: DisplayPoint) -> Self {
        Self {
            lng: p.lng,
            lat: p.lat,
        }
    }
}

impl From<StorePoint> for DisplayPoint {
    fn from(p: StorePoint) -> Self {
        Self {
            lat: p.lat,
            lng: p.lng,
        }
    }
}

impl From<DisplayPoint> for Point<f64> {
    fn from(p: DisplayPoint) -> Self {
        Point::new(p.lng, p.lat)
    }
}

impl From<StorePoint> for Point<f64> {
    fn from(p: StorePoint) -> Self {
        Point::new(p.lng, p.lat)
    }
}

/// Great-circle distance in miles on a sphere of the mean Earth radius.
#[must_use]
pub fn haversine_miles(a: DisplayPoint, b: DisplayPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b)) / METERS_PER_MILE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> DisplayPoint {
        DisplayPoint::new(lat, lng).expect("valid point")
    }

    #[test]
    fn distance_to_self_is_zero() {
        let nyc = pt(40.7506, -73.9971);
        assert!(haversine_miles(nyc, nyc).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (pt(40.7506, -73.9971), pt(34.0522, -118.2437)),
            (pt(-33.8688, 151.2093), pt(51.5074, -0.1278)),
            (pt(0.0, 179.9), pt(0.0, -179.9)),
            (pt(89.9, 0.0), pt(-89.9, 180.0)),
        ];
        for (a, b) in pairs {
            let ab = haversine_miles(a, b);
            let ba = haversine_miles(b, a);
            assert!((ab - ba).abs() < 1e-9, "{a:?} <-> {b:?}: {ab} vs {ba}");
            assert!(ab >= 0.0);
        }
    }

    #[test]
    fn zip_10001_to_nearby_farm_is_about_a_mile_and_a_half() {
        let d = haversine_miles(pt(40.7506, -73.9971), pt(40.73, -73.99));
        assert!((d - 1.4).abs() < 0.1, "got {d}");
    }

    #[test]
    fn new_york_to_los_angeles() {
        let d = haversine_miles(pt(40.7128, -74.0060), pt(34.0522, -118.2437));
        assert!((d - 2445.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_miles(pt(0.0, 0.0), pt(0.0, 180.0));
        // Half of a ~3958.8 mile mean-radius circumference.
        assert!((d - 12_437.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn geo_points_are_longitude_first() {
        let display = pt(40.73, -73.99);
        let from_display = Point::from(display);
        let from_store = Point::from(StorePoint::from(display));
        assert_eq!(from_display, from_store);
        assert!((from_display.x() + 73.99).abs() < f64::EPSILON);
        assert!((from_display.y() - 40.73).abs() < f64::EPSILON);
    }

    #[test]
    fn conversions_preserve_axes() {
        let display = pt(40.73, -73.99);
        let store = StorePoint::from(display);
        assert_eq!(store.xy(), (-73.99, 40.73));
        assert_eq!(DisplayPoint::from(store), display);
    }

    #[test]
    fn store_point_new_takes_longitude_first() {
        let store = StorePoint::new(-73.99, 40.73).expect("valid");
        assert!((store.lat - 40.73).abs() < f64::EPSILON);
        assert!((store.lng + 73.99).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_points_are_rejected() {
        assert!(DisplayPoint::new(91.0, 0.0).is_err());
        assert!(DisplayPoint::new(0.0, -180.5).is_err());
        assert!(DisplayPoint::new(f64::NAN, 0.0).is_err());
        // A swapped pair: 40.73 is a fine longitude but -173.99 is no latitude.
        assert!(StorePoint::new(40.73, -173.99).is_err());
    }
}
