//! Geographic points and store locations.

use serde::Serialize;

/// Errors that can occur when building a [`GeoPoint`] or [`Location`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// Longitude outside [-180, 180] or not finite.
    #[error("You must supply coordinates! (longitude {0} is out of range)")]
    Longitude(f64),
    /// Latitude outside [-90, 90] or not finite.
    #[error("You must supply coordinates! (latitude {0} is out of range)")]
    Latitude(f64),
    /// Address missing after trimming.
    #[error("You must supply an address!")]
    MissingAddress,
}

/// A WGS84 point, stored longitude first like `GeoJSON`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

impl GeoPoint {
    /// Mean earth radius in metres used for great-circle distances.
    pub const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

    /// Build a point from longitude and latitude in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is out of range or not finite.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, LocationError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::Longitude(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::Latitude(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// `[longitude, latitude]`, the `GeoJSON` coordinate order.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Haversine distance to `other` in metres.
    #[must_use]
    pub fn distance_metres(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * Self::EARTH_RADIUS_METRES * a.sqrt().asin()
    }
}

/// Where a store is: a point plus the human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    /// Always `"Point"`; kept for `GeoJSON` compatible output.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[longitude, latitude]`.
    pub coordinates: [f64; 2],
    /// Street address as typed by the author.
    pub address: String,
}

impl Location {
    /// Build a location, trimming the address.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::MissingAddress`] if the address is blank.
    pub fn new(point: GeoPoint, address: &str) -> Result<Self, LocationError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(LocationError::MissingAddress);
        }
        Ok(Self {
            kind: "Point",
            coordinates: point.coordinates(),
            address: address.to_owned(),
        })
    }

    /// The point this location refers to.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint {
            longitude: self.coordinates[0],
            latitude: self.coordinates[1],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_point_rejects_out_of_range() {
        assert!(matches!(GeoPoint::new(181.0, 0.0), Err(LocationError::Longitude(_))));
        assert!(matches!(GeoPoint::new(0.0, -90.5), Err(LocationError::Latitude(_))));
        assert!(matches!(GeoPoint::new(f64::NAN, 0.0), Err(LocationError::Longitude(_))));
    }

    #[test]
    fn test_coordinates_are_longitude_first() {
        let point = GeoPoint::new(-79.38, 43.65).unwrap();
        assert_eq!(point.coordinates(), [-79.38, 43.65]);
    }

    #[test]
    fn test_distance_zero_to_self() {
        let point = GeoPoint::new(-79.38, 43.65).unwrap();
        assert!(point.distance_metres(&point).abs() < 1e-6);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let d = a.distance_metres(&b);
        // 2 * pi * R / 360
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_location_requires_address() {
        let point = GeoPoint::new(0.0, 0.0).unwrap();
        assert_eq!(Location::new(point, "   "), Err(LocationError::MissingAddress));
        let location = Location::new(point, " 1 Main St ").unwrap();
        assert_eq!(location.address, "1 Main St");
        assert_eq!(location.point(), point);
    }

    #[test]
    fn test_location_serializes_as_geojson_point() {
        let point = GeoPoint::new(1.5, 2.5).unwrap();
        let json = serde_json::to_value(Location::new(point, "Somewhere").unwrap()).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 1.5);
        assert_eq!(json["address"], "Somewhere");
    }
}
