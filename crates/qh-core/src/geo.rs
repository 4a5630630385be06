//! Geographic locations and distances.
//!
//! Distances are in kilometres, depths are positive down in kilometres.

use crate::{QhError, QhResult, Real};

/// Mean earth radius (km).
pub const EARTH_RADIUS_KM: Real = 6371.0072;

/// Immutable (latitude, longitude, depth) value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    lat: Real,
    lon: Real,
    depth: Real,
}

impl Location {
    pub fn new(lat: Real, lon: Real, depth: Real) -> QhResult<Self> {
        crate::ensure_finite(lat, "latitude")?;
        crate::ensure_finite(lon, "longitude")?;
        crate::ensure_finite(depth, "depth")?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(QhError::OutOfRange {
                what: "latitude",
                value: lat,
                min: -90.0,
                max: 90.0,
            });
        }
        if !(-180.0..=360.0).contains(&lon) {
            return Err(QhError::OutOfRange {
                what: "longitude",
                value: lon,
                min: -180.0,
                max: 360.0,
            });
        }
        Ok(Self { lat, lon, depth })
    }

    /// Surface location (depth 0).
    pub fn surface(lat: Real, lon: Real) -> QhResult<Self> {
        Self::new(lat, lon, 0.0)
    }

    pub fn lat(&self) -> Real {
        self.lat
    }

    pub fn lon(&self) -> Real {
        self.lon
    }

    pub fn depth(&self) -> Real {
        self.depth
    }

    /// Same lat/lon at a different depth.
    pub fn with_depth(&self, depth: Real) -> QhResult<Self> {
        Self::new(self.lat, self.lon, depth)
    }
}

/// Great-circle surface distance (haversine).
pub fn horizontal_distance(a: &Location, b: &Location) -> Real {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Straight-line distance including the depth difference.
pub fn linear_distance(a: &Location, b: &Location) -> Real {
    let h = horizontal_distance(a, b);
    let v = a.depth - b.depth;
    (h * h + v * v).sqrt()
}
