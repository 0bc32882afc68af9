//! Distance helpers for junction tolerance checks

use crate::DistanceMetric;
use geo::{Coord, Rect};
use smallvec::SmallVec;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// Planar distance between two points
#[inline(always)]
pub fn euclidean_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Great-circle distance in meters between two (longitude, latitude) points in degrees
///
/// Uses the Haversine formula on a spherical Earth.
#[inline]
pub fn haversine_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let lat1 = a[1].to_radians();
    let lat2 = b[1].to_radians();
    let delta_lat = (b[1] - a[1]).to_radians();
    let delta_lon = (b[0] - a[0]).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance between two points under the given metric
#[inline]
pub fn distance(metric: DistanceMetric, a: [f64; 2], b: [f64; 2]) -> f64 {
    match metric {
        DistanceMetric::Euclidean => euclidean_distance(a, b),
        DistanceMetric::Haversine => haversine_distance(a, b),
    }
}

/// Longitude/latitude windows that together contain every point within `meters` of `center`
///
/// `center` is (longitude, latitude) in degrees with longitude in [-180, 180]. A circle that
/// crosses the antimeridian yields two windows, one on each side. When the circle reaches a
/// pole, or is wide enough to wrap, a single window spans all longitudes.
pub fn haversine_windows(center: [f64; 2], meters: f64) -> SmallVec<[Rect<f64>; 2]> {
    use std::f64::consts::FRAC_PI_2;

    let angular = meters / EARTH_RADIUS_M;
    let lat = center[1].to_radians();
    let min_lat = (lat - angular).max(-FRAC_PI_2).to_degrees();
    let max_lat = (lat + angular).min(FRAC_PI_2).to_degrees();
    let lon_band = |min_lon: f64, max_lon: f64| {
        Rect::new(
            Coord {
                x: min_lon,
                y: min_lat,
            },
            Coord {
                x: max_lon,
                y: max_lat,
            },
        )
    };

    let spread = angular.sin() / lat.cos();
    let reaches_pole = lat + angular >= FRAC_PI_2 || lat - angular <= -FRAC_PI_2;
    let mut windows = SmallVec::new();
    if reaches_pole || !spread.is_finite() || spread >= 1.0 {
        windows.push(lon_band(-180.0, 180.0));
        return windows;
    }

    let delta = spread.asin().to_degrees();
    let (min_lon, max_lon) = (center[0] - delta, center[0] + delta);
    if min_lon < -180.0 {
        windows.push(lon_band(-180.0, max_lon));
        windows.push(lon_band(min_lon + 360.0, 180.0));
    } else if max_lon > 180.0 {
        windows.push(lon_band(min_lon, 180.0));
        windows.push(lon_band(-180.0, max_lon - 360.0));
    } else {
        windows.push(lon_band(min_lon, max_lon));
    }
    windows
}
