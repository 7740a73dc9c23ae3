// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device location: fixes from an external provider mapped onto the map.

use crate::error::AppError;
use geo::{coord, Coord, Rect};
use std::future::Future;

/// Why no usable fix was obtained.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission was denied")]
    PermissionDenied,

    #[error("Location is unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for a location")]
    Timeout,

    #[error("You appear to be off campus")]
    OffCampus,

    #[error("Campus bounds are not configured")]
    NoCampusBounds,
}

impl From<GeolocationError> for AppError {
    fn from(err: GeolocationError) -> Self {
        AppError::Geolocation(err.to_string())
    }
}

/// Source of device position fixes (`x` = longitude, `y` = latitude).
pub trait Geolocator: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Coord<f64>, GeolocationError>> + Send;
}

/// Geolocator that always answers the same way.
#[derive(Debug, Clone)]
pub struct StaticGeolocator(pub Result<Coord<f64>, GeolocationError>);

impl StaticGeolocator {
    pub fn at(lon: f64, lat: f64) -> Self {
        Self(Ok(coord! { x: lon, y: lat }))
    }

    pub fn failing(err: GeolocationError) -> Self {
        Self(Err(err))
    }
}

impl Geolocator for StaticGeolocator {
    async fn current_position(&self) -> Result<Coord<f64>, GeolocationError> {
        self.0.clone()
    }
}

/// Map a lon/lat fix onto normalized map fractions.
///
/// The map image has north at the top, so latitude runs against `y`.
pub fn fix_to_normalized(fix: Coord<f64>, campus: &Rect<f64>) -> Result<(f64, f64), GeolocationError> {
    let (min, max) = (campus.min(), campus.max());
    if fix.x < min.x || fix.x > max.x || fix.y < min.y || fix.y > max.y {
        return Err(GeolocationError::OffCampus);
    }

    let fx = (fix.x - min.x) / campus.width();
    let fy = (max.y - fix.y) / campus.height();
    Ok((fx, fy))
}
