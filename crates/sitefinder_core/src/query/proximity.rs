//! Proximity predicate builder and geodesic distance.
//!
//! # Responsibility
//! - Validate the query point and radius.
//! - Produce the push-down `st_dwithin` predicate for the store.
//! - Compute shape-to-point distance on the sphere, in meters.
//!
//! # Invariants
//! - Distances are haversine meters, never planar degrees.
//! - A point inside or on the boundary of a polygon is at distance 0.
//! - Radius 0 matches only coincident points and containing polygons.

use crate::model::site::SiteShape;
use crate::query::{QueryError, QueryResult};
use geo::{
    Closest, HaversineClosestPoint, HaversineDistance, Intersects, LineString, Point, Polygon,
};
use rusqlite::types::Value;

/// SQL fragment evaluated per candidate row; binds are `lon, lat, radius`.
const DWITHIN_SQL: &str = "st_dwithin(sites.shape_json, ?, ?, ?)";

/// Validated "within distance" predicate around a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPredicate {
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
}

impl ProximityPredicate {
    /// Validates inputs; nothing is clamped.
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> QueryResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(QueryError::invalid(
                "latitude",
                format!("expected a finite value in [-90, 90], got {latitude}"),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(QueryError::invalid(
                "longitude",
                format!("expected a finite value in [-180, 180], got {longitude}"),
            ));
        }
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(QueryError::invalid(
                "radius",
                format!("expected a finite non-negative distance, got {radius_meters}"),
            ));
        }

        Ok(Self {
            latitude,
            longitude,
            radius_meters,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    pub fn query_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// In-memory evaluation, identical to the store-side predicate.
    pub fn matches(&self, shape: &SiteShape) -> bool {
        within_distance(shape, self.query_point(), self.radius_meters)
    }

    pub fn sql_fragment(&self) -> &'static str {
        DWITHIN_SQL
    }

    pub fn bind_values(&self) -> [Value; 3] {
        [
            Value::Real(self.longitude),
            Value::Real(self.latitude),
            Value::Real(self.radius_meters),
        ]
    }
}

/// Geodesic distance in meters from `point` to the nearest part of `shape`.
pub fn distance_to_shape_meters(shape: &SiteShape, point: Point<f64>) -> f64 {
    match shape {
        SiteShape::Point([lon, lat]) => Point::new(*lon, *lat).haversine_distance(&point),
        SiteShape::Polygon(rings) => {
            let mut rings = rings.iter().map(|ring| {
                LineString::from(
                    ring.iter()
                        .map(|[lon, lat]| (*lon, *lat))
                        .collect::<Vec<_>>(),
                )
            });
            let Some(exterior) = rings.next() else {
                return f64::INFINITY;
            };
            let interiors: Vec<LineString<f64>> = rings.collect();
            let polygon = Polygon::new(exterior, interiors);
            if point.intersects(&polygon) {
                return 0.0;
            }

            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring_distance_meters(ring, point))
                .fold(f64::INFINITY, f64::min)
        }
    }
}

/// Shared by [`ProximityPredicate::matches`] and the `st_dwithin` SQL function.
pub fn within_distance(shape: &SiteShape, point: Point<f64>, radius_meters: f64) -> bool {
    distance_to_shape_meters(shape, point) <= radius_meters
}

/// Edges are great-circle segments; the closest point is found on the sphere,
/// not in lon/lat degrees.
fn ring_distance_meters(ring: &LineString<f64>, point: Point<f64>) -> f64 {
    match ring.haversine_closest_point(&point) {
        Closest::Intersection(closest) | Closest::SinglePoint(closest) => {
            closest.haversine_distance(&point)
        }
        Closest::Indeterminate => f64::INFINITY,
    }
}
