//! GeoJSON projection of query results.
//!
//! # Responsibility
//! - Assemble a `FeatureCollection` from canonical site records.
//! - Keep geometry serialization at the output edge; records never carry
//!   pre-rendered geometry strings.
//!
//! # Invariants
//! - Feature order equals record order.
//! - `geometry` is the stored GeoJSON shape; `wkt` is derived from it.

use crate::model::attributes::AttributeGroup;
use crate::model::report::{Report, Review};
use crate::model::site::{Address, SiteId, SiteRecord, SiteShape};
use crate::query::proximity::distance_to_shape_meters;
use geo::Point;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<SiteFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub id: SiteId,
    pub geometry: SiteShape,
    pub properties: SiteProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteProperties {
    pub site_name: String,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carcinogen: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub release_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_releases: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substrate_type: Option<String>,
    pub wkt: String,
    /// Geodesic distance from the query point, when one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    pub equipment: Option<AttributeGroup>,
    pub amenities: Option<AttributeGroup>,
    pub sports_facilities: Option<AttributeGroup>,
    pub reports: Vec<Report>,
    pub reviews: Vec<Review>,
}

impl FeatureCollection {
    /// Projects records; `origin` adds `distance_meters` to every feature.
    pub fn from_records(records: &[SiteRecord], origin: Option<Point<f64>>) -> Self {
        Self {
            kind: "FeatureCollection",
            features: records
                .iter()
                .map(|record| SiteFeature::from_record(record, origin))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl SiteFeature {
    pub fn from_record(record: &SiteRecord, origin: Option<Point<f64>>) -> Self {
        let site = &record.site;
        Self {
            kind: "Feature",
            id: site.site_id.clone(),
            geometry: site.shape.clone(),
            properties: SiteProperties {
                site_name: site.site_name.clone(),
                address: site.address.clone(),
                sector: site.sector.clone(),
                carcinogen: site.carcinogen,
                release_types: site.release_types.clone(),
                total_releases: site.total_releases,
                substrate_type: site.substrate_type.clone(),
                wkt: site.shape.to_wkt(),
                distance_meters: origin.map(|point| distance_to_shape_meters(&site.shape, point)),
                equipment: record.equipment.clone(),
                amenities: record.amenities.clone(),
                sports_facilities: record.sports_facilities.clone(),
                reports: record.reports.clone(),
                reviews: record.reviews.clone(),
            },
        }
    }
}
