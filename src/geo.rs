// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Great-circle math and the planar projection backing nearest-node lookup.

/// Mean radius of Earth, in miles.
/// Source: https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius
const EARTH_RADIUS: f64 = 3963.0;

/// Mean diameter of Earth, in miles.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the [haversine formula](https://en.wikipedia.org/wiki/Haversine_formula).
/// Returns the result in miles.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    EARTH_DIAMETER * h.sqrt().asin()
}

/// Calculates the initial compass bearing of the great-circle arc from
/// the first lat-lon position towards the second, in degrees.
///
/// The result lies in (-180°, 180°], with 0° pointing north and 90° east.
/// Bearing is not symmetric: the arc leaves one endpoint at a different
/// angle than it arrives at the other.
pub fn initial_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees()
}

/// Planar [Transverse Mercator](https://en.wikipedia.org/wiki/Transverse_Mercator_projection)
/// projection (spherical form, unit scale factor) with a configurable origin.
///
/// Distortion grows with the distance from the central meridian, so the
/// origin should sit in the middle of the dataset; positions further than
/// about 90° of longitude away from it are not projectable. Outputs are in
/// Earth-radius units, which is fine for comparing distances, not measuring
/// them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Projection {
    /// Central meridian, in radians.
    lon0: f64,
    /// Latitude of the origin, in radians.
    lat0: f64,
}

impl Projection {
    /// Creates a projection with the origin at the given lon-lat position,
    /// in degrees.
    pub(crate) fn centered_at(lon0: f64, lat0: f64) -> Self {
        Self {
            lon0: lon0.to_radians(),
            lat0: lat0.to_radians(),
        }
    }

    /// Creates a projection centered on the bounding-box centroid of the
    /// provided lon-lat positions. An empty input centers the projection
    /// at (0°, 0°).
    pub(crate) fn centered_on<I: IntoIterator<Item = (f64, f64)>>(positions: I) -> Self {
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;

        for (lon, lat) in positions {
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
        }

        if min_lon > max_lon {
            Self::centered_at(0.0, 0.0)
        } else {
            Self::centered_at((min_lon + max_lon) * 0.5, (min_lat + max_lat) * 0.5)
        }
    }

    /// Projects a lon-lat position (in degrees) onto the plane.
    pub(crate) fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let dlon = lon.to_radians() - self.lon0;
        let phi = lat.to_radians();

        let b = dlon.sin() * phi.cos();
        let x = b.atanh();
        let y = (phi.tan() / dlon.cos()).atan() - self.lat0;
        (x, y)
    }
}
