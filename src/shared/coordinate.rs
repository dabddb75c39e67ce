use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};

/// A (latitude, longitude) pair in decimal degrees
///
/// Latitude and longitude only ever travel together; an item or session
/// either has the whole pair or none of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 35.0)]
    pub latitude: f64,
    #[schema(example = 135.8)]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside [-90, 90] x [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Combine separately supplied parts, rejecting a half-set pair
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Self>> {
        match (latitude, longitude) {
            (None, None) => Ok(None),
            (Some(latitude), Some(longitude)) => {
                let coordinate = Self::new(latitude, longitude);
                if !coordinate.is_valid() {
                    return Err(AppError::Validation(format!(
                        "Coordinate {} is out of range",
                        coordinate
                    )));
                }
                Ok(Some(coordinate))
            }
            (Some(_), None) => Err(AppError::Validation(
                "latitude was supplied without longitude".to_string(),
            )),
            (None, Some(_)) => Err(AppError::Validation(
                "longitude was supplied without latitude".to_string(),
            )),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_both_or_neither() {
        assert_eq!(Coordinate::from_parts(None, None).unwrap(), None);
        assert_eq!(
            Coordinate::from_parts(Some(35.0), Some(135.8)).unwrap(),
            Some(Coordinate::new(35.0, 135.8))
        );
        assert!(matches!(
            Coordinate::from_parts(Some(35.0), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Coordinate::from_parts(None, Some(135.8)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_range_checks() {
        assert!(Coordinate::new(90.0, -180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(Coordinate::from_parts(Some(f64::INFINITY), Some(0.0)).is_err());
    }
}
