use std::cmp::Ordering;

use crate::firestore::error::{invalid_argument, FirestoreResult};

/// A latitude/longitude pair. Construction rejects out-of-range (and NaN) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> FirestoreResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(invalid_argument(format!(
                "Latitude must be between -90 and 90 degrees, got {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid_argument(format!(
                "Longitude must be between -180 and 180 degrees, got {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude first, then longitude. Total because coordinates are never NaN.
    pub fn compare(&self, other: &Self) -> Ordering {
        let latitude = self.latitude.partial_cmp(&other.latitude);
        let longitude = self.longitude.partial_cmp(&other.longitude);
        latitude
            .unwrap_or(Ordering::Equal)
            .then(longitude.unwrap_or(Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_coordinates() {
        let point = GeoPoint::new(10.0, 20.0).unwrap();
        assert_eq!(point.latitude(), 10.0);
        assert_eq!(point.longitude(), 20.0);
    }

    #[test]
    fn rejects_invalid_coordinates() {
        assert!(GeoPoint::new(100.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn orders_by_latitude_then_longitude() {
        let a = GeoPoint::new(1.0, 5.0).unwrap();
        let b = GeoPoint::new(1.0, 6.0).unwrap();
        let c = GeoPoint::new(2.0, -180.0).unwrap();
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(c.compare(&b), Ordering::Greater);
    }
}
