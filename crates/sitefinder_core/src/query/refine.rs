//! Post-fetch refinement over eager-loaded attribute groups.
//!
//! # Responsibility
//! - Validate requested flag names per category before the store is touched.
//! - Keep only candidates that carry every requested flag.
//!
//! # Invariants
//! - Requested flags are ANDed within and across categories.
//! - A missing group, an unknown value or a zero value fails the flag.
//! - Refinement never reorders candidates; it only drops them.

use crate::model::attributes::AttributeCategory;
use crate::model::site::SiteRecord;
use crate::query::params::RequestedFlags;
use crate::query::QueryResult;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Validated flag names grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefinementRequest {
    requested: BTreeMap<AttributeCategory, BTreeSet<&'static str>>,
}

impl RefinementRequest {
    /// Resolves every requested name against its category schema.
    pub fn from_flags(flags: &RequestedFlags) -> QueryResult<Self> {
        let mut request = Self::default();
        for (category, names) in [
            (AttributeCategory::Equipment, &flags.equipment),
            (AttributeCategory::Amenities, &flags.amenities),
            (AttributeCategory::SportsFacilities, &flags.sports_facilities),
        ] {
            for name in names {
                let field = category.resolve_field(name)?;
                request.requested.entry(category).or_default().insert(field);
            }
        }
        Ok(request)
    }

    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }

    /// Requested fields of one category, in name order.
    pub fn fields(&self, category: AttributeCategory) -> impl Iterator<Item = &'static str> + '_ {
        self.requested
            .get(&category)
            .into_iter()
            .flat_map(|fields| fields.iter().copied())
    }

    /// Checks one record; the first failing flag is reported.
    pub fn evaluate(&self, record: &SiteRecord) -> Result<(), Rejection> {
        for (category, fields) in &self.requested {
            let Some(group) = record.attribute_group(*category) else {
                return Err(Rejection::MissingGroup(*category));
            };
            for &field in fields {
                if !group.has(field) {
                    return Err(Rejection::FlagNotPresent {
                        category: *category,
                        field,
                        value: group.value(field),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn accepts(&self, record: &SiteRecord) -> bool {
        self.evaluate(record).is_ok()
    }
}

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingGroup(AttributeCategory),
    FlagNotPresent {
        category: AttributeCategory,
        field: &'static str,
        value: Option<u32>,
    },
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGroup(category) => write!(f, "no {category} data"),
            Self::FlagNotPresent {
                category,
                field,
                value: Some(value),
            } => write!(f, "{category}.{field}={value}"),
            Self::FlagNotPresent {
                category,
                field,
                value: None,
            } => write!(f, "{category}.{field} unknown"),
        }
    }
}

/// Returns the candidates that satisfy `request`, in their original order.
pub fn refine(records: Vec<SiteRecord>, request: &RefinementRequest) -> Vec<SiteRecord> {
    if request.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| request.accepts(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{refine, Rejection, RefinementRequest};
    use crate::error::ErrorKind;
    use crate::model::attributes::{AttributeCategory, AttributeGroup};
    use crate::model::site::{Address, Site, SiteRecord, SiteShape};
    use crate::query::params::RequestedFlags;

    fn record(id: &str) -> SiteRecord {
        SiteRecord::new(Site::new(
            id,
            "Playground",
            Address::default(),
            SiteShape::point(-93.0, 45.0),
        ))
    }

    fn equipment(values: &[(&str, Option<u32>)]) -> AttributeGroup {
        let mut group = AttributeGroup::new(AttributeCategory::Equipment);
        for (name, value) in values {
            group.set(name, *value).unwrap();
        }
        group
    }

    fn request(equipment: &[&str], amenities: &[&str]) -> RefinementRequest {
        RefinementRequest::from_flags(&RequestedFlags {
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            amenities: amenities.iter().map(|s| s.to_string()).collect(),
            sports_facilities: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn unknown_flag_name_fails_validation() {
        let err = RefinementRequest::from_flags(&RequestedFlags {
            equipment: vec!["trampoline".to_string()],
            ..RequestedFlags::default()
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAttributeName);
    }

    #[test]
    fn missing_group_zero_and_null_all_fail() {
        let request = request(&["slides"], &[]);

        let missing = record("missing");
        assert_eq!(
            request.evaluate(&missing),
            Err(Rejection::MissingGroup(AttributeCategory::Equipment))
        );

        let mut zero = record("zero");
        zero.set_attribute_group(equipment(&[("slides", Some(0))]));
        assert!(!request.accepts(&zero));

        let mut null = record("null");
        null.set_attribute_group(equipment(&[("slides", None)]));
        assert!(matches!(
            request.evaluate(&null),
            Err(Rejection::FlagNotPresent { value: None, .. })
        ));
    }

    #[test]
    fn flags_are_anded_across_categories() {
        let request = request(&["slides", "standard_swings"], &["benches"]);

        let mut full = record("full");
        full.set_attribute_group(equipment(&[
            ("slides", Some(2)),
            ("standard_swings", Some(1)),
        ]));
        full.set_attribute_group(
            AttributeGroup::new(AttributeCategory::Amenities)
                .with("benches", 3)
                .unwrap(),
        );

        let mut no_amenities = record("no_amenities");
        no_amenities.set_attribute_group(equipment(&[
            ("slides", Some(2)),
            ("standard_swings", Some(1)),
        ]));

        let mut one_swing_short = record("short");
        one_swing_short.set_attribute_group(equipment(&[
            ("slides", Some(2)),
            ("standard_swings", Some(0)),
        ]));

        let kept = refine(vec![full, no_amenities, one_swing_short], &request);
        let ids: Vec<&str> = kept.iter().map(SiteRecord::site_id).collect();
        assert_eq!(ids, vec!["full"]);
    }

    #[test]
    fn empty_request_keeps_everything_in_order() {
        let request = RefinementRequest::default();
        let kept = refine(vec![record("b"), record("a")], &request);
        let ids: Vec<&str> = kept.iter().map(SiteRecord::site_id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
