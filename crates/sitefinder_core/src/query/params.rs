//! Request-scoped query parameters.
//!
//! # Responsibility
//! - Hold the point, radius and optional filters of one site query.
//! - Bind raw `key=value` request pairs the same way for every host.
//!
//! # Invariants
//! - `radius_meters` is already in store units; miles are converted at the
//!   boundary by [`miles_to_meters`].
//! - List-valued parameters accept comma-separated values and repeated keys.

use crate::query::{QueryError, QueryResult};
use log::debug;

/// Statute mile in meters, as used by the query boundary.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Converts a user-facing radius in miles to store meters.
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Per-category flag names requested by the client, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedFlags {
    pub equipment: Vec<String>,
    pub amenities: Vec<String>,
    pub sports_facilities: Vec<String>,
}

impl RequestedFlags {
    pub fn is_empty(&self) -> bool {
        self.equipment.is_empty() && self.amenities.is_empty() && self.sports_facilities.is_empty()
    }
}

/// One site query.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    /// `Some(true)` restricts to carcinogen sites; anything else is no constraint.
    pub carcinogen: Option<bool>,
    /// Must be one of the site's release types.
    pub release_type: Option<String>,
    pub substrate_type: Option<String>,
    /// Site sector must be any of these. Empty means no constraint.
    pub sectors: Vec<String>,
    pub requested: RequestedFlags,
}

impl SiteQuery {
    /// Creates an unfiltered query around a point.
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_meters,
            carcinogen: None,
            release_type: None,
            substrate_type: None,
            sectors: Vec::new(),
            requested: RequestedFlags::default(),
        }
    }

    pub fn with_carcinogen(mut self, carcinogen: bool) -> Self {
        self.carcinogen = Some(carcinogen);
        self
    }

    pub fn with_release_type(mut self, release_type: impl Into<String>) -> Self {
        self.release_type = Some(release_type.into());
        self
    }

    pub fn with_substrate_type(mut self, substrate_type: impl Into<String>) -> Self {
        self.substrate_type = Some(substrate_type.into());
        self
    }

    pub fn with_sectors<I, S>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sectors = sectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_equipment<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.equipment = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_amenities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.amenities = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sports_facilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.sports_facilities = names.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether any optional filter is set.
    pub fn has_filters(&self) -> bool {
        self.carcinogen == Some(true)
            || self.release_type.is_some()
            || self.substrate_type.is_some()
            || !self.sectors.is_empty()
            || !self.requested.is_empty()
    }

    /// Binds raw request pairs.
    ///
    /// Accepted keys: `lat`/`latitude`, `lon`/`longitude`, `radius` (miles),
    /// `radius_meters`, `carcinogen`, `release_type`, `substrate_type`,
    /// `sectors`, `equipment`, `amenities`, `sports_facilities`. Unknown keys
    /// are ignored. Exactly one of `radius` / `radius_meters` is required.
    /// List keys may repeat; every other key may appear at most once.
    pub fn from_pairs<I, K, V>(pairs: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut latitude = None;
        let mut longitude = None;
        let mut radius_meters = None;
        let mut query = Self::new(0.0, 0.0, 0.0);

        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "lat" | "latitude" => {
                    set_once(&mut latitude, "latitude", parse_float("latitude", value)?)?;
                }
                "lon" | "longitude" => {
                    set_once(&mut longitude, "longitude", parse_float("longitude", value)?)?;
                }
                "radius" => {
                    let meters = miles_to_meters(parse_float("radius", value)?);
                    set_once(&mut radius_meters, "radius", meters)?;
                }
                "radius_meters" => {
                    set_once(&mut radius_meters, "radius", parse_float("radius_meters", value)?)?;
                }
                "carcinogen" => {
                    set_once(&mut query.carcinogen, "carcinogen", parse_bool("carcinogen", value)?)?;
                }
                "release_type" => {
                    set_once(&mut query.release_type, "release_type", value.to_string())?;
                }
                "substrate_type" => {
                    set_once(&mut query.substrate_type, "substrate_type", value.to_string())?;
                }
                "sectors" => query.sectors.extend(split_list(value)),
                "equipment" => query.requested.equipment.extend(split_list(value)),
                "amenities" => query.requested.amenities.extend(split_list(value)),
                "sports_facilities" => {
                    query.requested.sports_facilities.extend(split_list(value));
                }
                other => debug!("event=query_bind module=query status=skip key={other}"),
            }
        }

        query.latitude = latitude.ok_or_else(|| QueryError::invalid("latitude", "missing"))?;
        query.longitude = longitude.ok_or_else(|| QueryError::invalid("longitude", "missing"))?;
        query.radius_meters = radius_meters.ok_or_else(|| QueryError::invalid("radius", "missing"))?;
        Ok(query)
    }
}

/// Single-valued keys may appear once; `radius` and `radius_meters` share a slot.
fn set_once<T>(slot: &mut Option<T>, name: &'static str, value: T) -> QueryResult<()> {
    if slot.is_some() {
        return Err(QueryError::invalid(name, format!("{name} was supplied more than once")));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_float(name: &'static str, value: &str) -> QueryResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|err| QueryError::invalid(name, format!("`{value}` is not a number: {err}")))
}

fn parse_bool(name: &'static str, value: &str) -> QueryResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(QueryError::invalid(
            name,
            format!("`{value}` is not a boolean"),
        )),
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}
