//! Site domain model.
//!
//! # Responsibility
//! - Define the located entity shared by toxic-release and playground data.
//! - Keep geometry in a canonical, serialization-agnostic shape.
//!
//! # Invariants
//! - `site_id` is unique and non-blank.
//! - Shape coordinates are finite WGS84 `[lon, lat]` pairs within range.
//! - Polygon rings are closed and have at least four positions.
//! - Attribute groups are 0..1 per category (`Option`, never a list).

use crate::model::attributes::{AttributeCategory, AttributeGroup};
use crate::model::report::{Report, Review};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter, Write};

/// Stable site identifier (external registry id, e.g. TRI facility id).
pub type SiteId = String;

/// `[longitude, latitude]` in degrees.
pub type Position = [f64; 2];

/// Canonical site geometry.
///
/// Serialized form is a GeoJSON geometry object, which is also the storage
/// format of `sites.shape_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum SiteShape {
    Point(Position),
    /// First ring is the exterior, remaining rings are holes.
    Polygon(Vec<Vec<Position>>),
}

impl SiteShape {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self::Point([longitude, latitude])
    }

    /// Builds a hole-free polygon, closing the ring when the caller did not.
    pub fn polygon(exterior: Vec<Position>) -> Self {
        let mut ring = exterior;
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self::Polygon(vec![ring])
    }

    pub fn validate(&self) -> Result<(), SiteValidationError> {
        match self {
            Self::Point(position) => validate_position(position),
            Self::Polygon(rings) => {
                if rings.is_empty() {
                    return Err(SiteValidationError::InvalidShape(
                        "polygon requires an exterior ring".to_string(),
                    ));
                }
                for ring in rings {
                    if ring.len() < 4 {
                        return Err(SiteValidationError::InvalidShape(format!(
                            "polygon ring needs at least 4 positions, got {}",
                            ring.len()
                        )));
                    }
                    if ring.first() != ring.last() {
                        return Err(SiteValidationError::InvalidShape(
                            "polygon ring is not closed".to_string(),
                        ));
                    }
                    for position in ring {
                        validate_position(position)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Renders the shape as well-known text.
    pub fn to_wkt(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Point([lon, lat]) => {
                let _ = write!(out, "POINT({lon} {lat})");
            }
            Self::Polygon(rings) => {
                out.push_str("POLYGON(");
                for (ring_idx, ring) in rings.iter().enumerate() {
                    if ring_idx > 0 {
                        out.push_str(", ");
                    }
                    out.push('(');
                    for (idx, [lon, lat]) in ring.iter().enumerate() {
                        if idx > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(out, "{lon} {lat}");
                    }
                    out.push(')');
                }
                out.push(')');
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(value: &str) -> serde_json::Result<Self> {
        serde_json::from_str(value)
    }
}

fn validate_position(position: &Position) -> Result<(), SiteValidationError> {
    let [lon, lat] = *position;
    if !lon.is_finite() || !lat.is_finite() {
        return Err(SiteValidationError::InvalidShape(
            "coordinates must be finite".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(SiteValidationError::InvalidShape(format!(
            "coordinate out of range: lon={lon} lat={lat}"
        )));
    }
    Ok(())
}

/// Postal address of a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub county: Option<String>,
    /// Two-letter state code.
    pub state: String,
    /// Kept as text so leading zeros survive.
    pub zip: String,
}

/// Located point of interest.
///
/// Toxic-release facilities populate `sector`, `carcinogen`, `release_types`
/// and `total_releases`; playgrounds populate `substrate_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: SiteId,
    pub site_name: String,
    pub address: Address,
    pub shape: SiteShape,
    pub sector: Option<String>,
    pub carcinogen: Option<bool>,
    /// Multi-valued release medium (`AIR`, `WATER`, `LAND`), stored uppercase.
    pub release_types: Vec<String>,
    pub total_releases: Option<f64>,
    pub substrate_type: Option<String>,
}

impl Site {
    /// Creates a site with empty optional attributes.
    pub fn new(
        site_id: impl Into<SiteId>,
        site_name: impl Into<String>,
        address: Address,
        shape: SiteShape,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            site_name: site_name.into(),
            address,
            shape,
            sector: None,
            carcinogen: None,
            release_types: Vec::new(),
            total_releases: None,
            substrate_type: None,
        }
    }

    pub fn validate(&self) -> Result<(), SiteValidationError> {
        if self.site_id.trim().is_empty() {
            return Err(SiteValidationError::BlankField("site_id"));
        }
        if self.site_name.trim().is_empty() {
            return Err(SiteValidationError::BlankField("site_name"));
        }
        let state = self.address.state.trim();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SiteValidationError::InvalidState(
                self.address.state.clone(),
            ));
        }
        if let Some(total) = self.total_releases {
            if !total.is_finite() || total < 0.0 {
                return Err(SiteValidationError::InvalidTotalReleases(total));
            }
        }
        if self
            .release_types
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(SiteValidationError::BlankField("release_types"));
        }
        self.shape.validate()
    }
}

/// Site plus its eager-loaded related rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRecord {
    pub site: Site,
    pub equipment: Option<AttributeGroup>,
    pub amenities: Option<AttributeGroup>,
    pub sports_facilities: Option<AttributeGroup>,
    pub reports: Vec<Report>,
    pub reviews: Vec<Review>,
}

impl SiteRecord {
    /// Wraps a site with no related rows loaded yet.
    pub fn new(site: Site) -> Self {
        Self {
            site,
            equipment: None,
            amenities: None,
            sports_facilities: None,
            reports: Vec::new(),
            reviews: Vec::new(),
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site.site_id
    }

    pub fn attribute_group(&self, category: AttributeCategory) -> Option<&AttributeGroup> {
        match category {
            AttributeCategory::Equipment => self.equipment.as_ref(),
            AttributeCategory::Amenities => self.amenities.as_ref(),
            AttributeCategory::SportsFacilities => self.sports_facilities.as_ref(),
        }
    }

    /// Attaches a group to the slot of its own category, replacing any previous one.
    pub fn set_attribute_group(&mut self, group: AttributeGroup) {
        match group.category() {
            AttributeCategory::Equipment => self.equipment = Some(group),
            AttributeCategory::Amenities => self.amenities = Some(group),
            AttributeCategory::SportsFacilities => self.sports_facilities = Some(group),
        }
    }
}

/// Site validation failures raised before persistence.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteValidationError {
    BlankField(&'static str),
    InvalidState(String),
    InvalidTotalReleases(f64),
    InvalidShape(String),
}

impl Display for SiteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "site field `{field}` must not be blank"),
            Self::InvalidState(value) => {
                write!(f, "state must be a two-letter code, got `{value}`")
            }
            Self::InvalidTotalReleases(value) => {
                write!(f, "total_releases must be finite and non-negative, got {value}")
            }
            Self::InvalidShape(message) => write!(f, "invalid site shape: {message}"),
        }
    }
}

impl Error for SiteValidationError {}
