//! Per-site attribute groups (equipment, amenities, sports facilities).
//!
//! # Responsibility
//! - Own the fixed field schema of every attribute category.
//! - Resolve user-supplied flag names against that schema.
//!
//! # Invariants
//! - Field values are non-negative counts; `Some(0)` means confirmed absent,
//!   `None` means unknown.
//! - A group only ever holds fields of its own category.

use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const EQUIPMENT_FIELDS: &[&str] = &[
    "diggers",
    "ladders",
    "toddler_swings",
    "standard_swings",
    "tire_swings",
    "accessible_swings",
    "seesaws",
    "climbers",
    "spinners",
    "bridges",
    "tunnels",
    "slides",
    "thematic",
    "ropes",
    "fire_poles",
    "staircases",
    "musical",
    "play_towers",
    "telephones",
    "binoculars",
    "tactile",
    "bouncers",
];

const AMENITIES_FIELDS: &[&str] = &[
    "splash_pad",
    "beach",
    "changing_rooms",
    "waterfront",
    "concessions",
    "rentals",
    "indoor_restroom",
    "portable_restroom",
    "trails",
    "picnic_tables",
    "benches",
    "shelter",
    "sun_shades",
    "grills",
];

const SPORTS_FACILITIES_FIELDS: &[&str] = &[
    "skate_park",
    "tennis_court",
    "hockey_rink",
    "soccer_field",
    "basketball_court",
    "baseball_diamond",
];

/// Attribute category; each maps to one 0..1 table keyed by site id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeCategory {
    Equipment,
    Amenities,
    SportsFacilities,
}

impl AttributeCategory {
    pub const ALL: [Self; 3] = [Self::Equipment, Self::Amenities, Self::SportsFacilities];

    /// Query parameter name and table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Amenities => "amenities",
            Self::SportsFacilities => "sports_facilities",
        }
    }

    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Equipment => EQUIPMENT_FIELDS,
            Self::Amenities => AMENITIES_FIELDS,
            Self::SportsFacilities => SPORTS_FACILITIES_FIELDS,
        }
    }

    /// Resolves a user-supplied flag name to its schema field.
    ///
    /// Matching trims whitespace and ignores ASCII case.
    pub fn resolve_field(self, name: &str) -> Result<&'static str, UnknownAttributeError> {
        let trimmed = name.trim();
        self.field_names()
            .iter()
            .copied()
            .find(|field| field.eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownAttributeError {
                category: self,
                name: name.to_string(),
            })
    }
}

impl Display for AttributeCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag name not present in the category schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttributeError {
    pub category: AttributeCategory,
    pub name: String,
}

impl Display for UnknownAttributeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown {} attribute `{}`; expected one of: {}",
            self.category,
            self.name,
            self.category.field_names().join(", ")
        )
    }
}

impl Error for UnknownAttributeError {}

/// One attribute-group row for a single site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeGroup {
    #[serde(skip)]
    category: AttributeCategory,
    #[serde(flatten)]
    values: BTreeMap<&'static str, Option<u32>>,
}

impl AttributeGroup {
    /// Creates a group where every field is unknown.
    pub fn new(category: AttributeCategory) -> Self {
        let values = category
            .field_names()
            .iter()
            .map(|field| (*field, None))
            .collect();
        Self { category, values }
    }

    pub fn category(&self) -> AttributeCategory {
        self.category
    }

    pub fn set(&mut self, name: &str, value: Option<u32>) -> Result<(), UnknownAttributeError> {
        let field = self.category.resolve_field(name)?;
        self.values.insert(field, value);
        Ok(())
    }

    /// Builder form of [`AttributeGroup::set`].
    pub fn with(mut self, name: &str, value: u32) -> Result<Self, UnknownAttributeError> {
        self.set(name, Some(value))?;
        Ok(self)
    }

    /// Stored value; `None` when the field is unknown.
    pub fn value(&self, field: &str) -> Option<u32> {
        self.values.get(field).copied().flatten()
    }

    /// True only for a known, non-zero value.
    pub fn has(&self, field: &str) -> bool {
        matches!(self.value(field), Some(count) if count > 0)
    }

    /// Fields in schema-independent (alphabetical) order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<u32>)> + '_ {
        self.values.iter().map(|(field, value)| (*field, *value))
    }
}
