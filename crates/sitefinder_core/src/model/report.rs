//! Report and review records attached to sites.
//!
//! # Invariants
//! - Report subtype is carried by an explicit `report_type` tag; it is never
//!   inferred from which optional fields a payload happens to contain.
//! - `EQUIPMENT_ISSUE` reports always name one equipment schema field.
//! - Review stars are within `1..=5`.

use crate::model::attributes::{AttributeCategory, UnknownAttributeError};
use crate::model::site::SiteId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

/// Report subtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "report_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    Hazard,
    Litter,
    OffleashDog,
    EquipmentIssue {
        /// Equipment schema field the issue refers to.
        equipment: String,
    },
    Vandalism,
    Damage,
}

impl ReportKind {
    /// Tag persisted in `reports.report_type`.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Hazard => "HAZARD",
            Self::Litter => "LITTER",
            Self::OffleashDog => "OFFLEASH_DOG",
            Self::EquipmentIssue { .. } => "EQUIPMENT_ISSUE",
            Self::Vandalism => "VANDALISM",
            Self::Damage => "DAMAGE",
        }
    }

    pub fn equipment(&self) -> Option<&str> {
        match self {
            Self::EquipmentIssue { equipment } => Some(equipment.as_str()),
            _ => None,
        }
    }

    /// Rebuilds a kind from its persisted columns.
    pub fn from_db(tag: &str, equipment: Option<String>) -> Result<Self, ReportKindError> {
        let kind = match (tag, equipment) {
            ("HAZARD", None) => Self::Hazard,
            ("LITTER", None) => Self::Litter,
            ("OFFLEASH_DOG", None) => Self::OffleashDog,
            ("EQUIPMENT_ISSUE", Some(equipment)) => Self::EquipmentIssue { equipment },
            ("EQUIPMENT_ISSUE", None) => {
                return Err(ReportKindError::MissingEquipment);
            }
            ("VANDALISM", None) => Self::Vandalism,
            ("DAMAGE", None) => Self::Damage,
            (
                "HAZARD" | "LITTER" | "OFFLEASH_DOG" | "VANDALISM" | "DAMAGE",
                Some(_),
            ) => {
                return Err(ReportKindError::UnexpectedEquipment(tag.to_string()));
            }
            (other, _) => return Err(ReportKindError::UnknownTag(other.to_string())),
        };
        Ok(kind)
    }

    /// Canonicalizes the equipment name against the equipment schema.
    pub fn normalized(self) -> Result<Self, UnknownAttributeError> {
        match self {
            Self::EquipmentIssue { equipment } => {
                let field = AttributeCategory::Equipment.resolve_field(&equipment)?;
                Ok(Self::EquipmentIssue {
                    equipment: field.to_string(),
                })
            }
            other => Ok(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKindError {
    UnknownTag(String),
    MissingEquipment,
    UnexpectedEquipment(String),
}

impl Display for ReportKindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTag(tag) => write!(f, "unknown report_type `{tag}`"),
            Self::MissingEquipment => {
                write!(f, "EQUIPMENT_ISSUE report is missing its equipment field")
            }
            Self::UnexpectedEquipment(tag) => {
                write!(f, "report_type `{tag}` must not carry an equipment field")
            }
        }
    }
}

impl Error for ReportKindError {}

/// Client payload for a new report. `report_type` is the tag of `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReport {
    pub site_id: SiteId,
    #[serde(flatten)]
    pub kind: ReportKind,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub report_id: Uuid,
    pub site_id: SiteId,
    pub user_email: String,
    #[serde(flatten)]
    pub kind: ReportKind,
    pub comment: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Client payload for a new review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub site_id: SiteId,
    pub stars: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Persisted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub review_id: Uuid,
    pub site_id: SiteId,
    pub user_email: String,
    pub stars: u8,
    pub comment: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
