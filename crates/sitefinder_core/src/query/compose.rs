//! Predicate composition.
//!
//! # Responsibility
//! - Combine the proximity predicate with every present attribute filter
//!   into one `WHERE` clause plus positional binds.
//! - Split requested attribute flags off into a [`RefinementRequest`].
//!
//! # Invariants
//! - The proximity predicate is always the first conjunct.
//! - Filter values are bound, never interpolated into SQL text.
//! - Binds appear in the same order as their `?` placeholders.

use crate::query::params::SiteQuery;
use crate::query::proximity::ProximityPredicate;
use crate::query::refine::RefinementRequest;
use crate::query::{QueryError, QueryResult};
use rusqlite::types::Value;
use std::collections::BTreeSet;

/// Store-ready form of one [`SiteQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub proximity: ProximityPredicate,
    /// Conjunction over `sites` rows, without the `WHERE` keyword.
    pub where_sql: String,
    pub bind_values: Vec<Value>,
    pub refinement: RefinementRequest,
}

/// Validates `query` and composes its predicates.
pub fn compose(query: &SiteQuery) -> QueryResult<ComposedQuery> {
    let proximity =
        ProximityPredicate::new(query.latitude, query.longitude, query.radius_meters)?;
    let mut where_sql = String::from(proximity.sql_fragment());
    let mut bind_values: Vec<Value> = proximity.bind_values().into();

    if query.carcinogen == Some(true) {
        where_sql.push_str(" AND sites.carcinogen = 1");
    }

    if let Some(release_type) = query.release_type.as_deref() {
        let release_type = non_blank("release_type", release_type)?.to_ascii_uppercase();
        where_sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM site_release_types srt
                WHERE srt.site_id = sites.site_id
                  AND srt.release_type = ?
            )",
        );
        bind_values.push(Value::Text(release_type));
    }

    if let Some(substrate_type) = query.substrate_type.as_deref() {
        let substrate_type = non_blank("substrate_type", substrate_type)?;
        where_sql.push_str(" AND sites.substrate_type = ?");
        bind_values.push(Value::Text(substrate_type.to_string()));
    }

    let mut seen = BTreeSet::new();
    let sectors: Vec<&str> = query
        .sectors
        .iter()
        .map(|sector| sector.trim())
        .filter(|sector| !sector.is_empty())
        .filter(|sector| seen.insert(*sector))
        .collect();
    if !sectors.is_empty() {
        where_sql.push_str(" AND sites.sector IN (");
        where_sql.push_str(&vec!["?"; sectors.len()].join(", "));
        where_sql.push(')');
        bind_values.extend(sectors.into_iter().map(|sector| Value::Text(sector.to_string())));
    }

    let refinement = RefinementRequest::from_flags(&query.requested)?;

    Ok(ComposedQuery {
        proximity,
        where_sql,
        bind_values,
        refinement,
    })
}

fn non_blank<'a>(name: &'static str, value: &'a str) -> QueryResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(QueryError::invalid(name, "must not be blank"));
    }
    Ok(trimmed)
}
