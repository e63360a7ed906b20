//! Site repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Execute composed site queries against the `sites` table.
//! - Eager-load release types, attribute groups, reports and reviews for
//!   every returned site.
//! - Provide the write paths used by importers and fixtures.
//!
//! # Invariants
//! - One query's candidate rows and related rows are read in one
//!   transaction, so a result never mixes two store snapshots.
//! - Result order is `site_id` ascending.
//! - Write paths call `Site::validate()` before SQL mutations.

use crate::db::DbError;
use crate::model::attributes::{AttributeCategory, AttributeGroup};
use crate::model::site::{Address, Site, SiteId, SiteRecord, SiteShape, SiteValidationError};
use crate::query::compose::ComposedQuery;
use crate::repo::submission_repo::{load_reports, load_reviews};
use crate::repo::{placeholders, IN_CLAUSE_CHUNK};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SITE_SELECT_SQL: &str = "SELECT
    site_id,
    site_name,
    addr_street1,
    addr_street2,
    addr_city,
    addr_county,
    addr_state,
    addr_zip,
    shape_json,
    sector,
    carcinogen,
    substrate_type,
    total_releases
FROM sites";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every persistence contract in core.
#[derive(Debug)]
pub enum RepoError {
    Validation(SiteValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: String },
    Conflict { entity: &'static str, id: String },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { entity, id } => write!(f, "{entity} already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<SiteValidationError> for RepoError {
    fn from(value: SiteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for sites and their attribute groups.
pub trait SiteRepository {
    /// Returns every site matching the composed predicates, fully loaded.
    fn fetch_sites(&self, query: &ComposedQuery) -> RepoResult<Vec<SiteRecord>>;
    fn get_site(&self, site_id: &str) -> RepoResult<Option<SiteRecord>>;
    fn site_exists(&self, site_id: &str) -> RepoResult<bool>;
    /// Inserts a site with its release types; existing ids are a conflict.
    fn insert_site(&self, site: &Site) -> RepoResult<()>;
    /// Creates or replaces the group row of `group.category()` for a site.
    fn put_attribute_group(&self, site_id: &str, group: &AttributeGroup) -> RepoResult<()>;
}

/// SQLite-backed site repository.
pub struct SqliteSiteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSiteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SiteRepository for SqliteSiteRepository<'_> {
    fn fetch_sites(&self, query: &ComposedQuery) -> RepoResult<Vec<SiteRecord>> {
        let sql = format!(
            "{SITE_SELECT_SQL} WHERE {} ORDER BY site_id ASC",
            query.where_sql
        );
        let tx = self.conn.unchecked_transaction()?;
        let records = load_records(&tx, &sql, query.bind_values.clone())?;
        tx.commit()?;
        Ok(records)
    }

    fn get_site(&self, site_id: &str) -> RepoResult<Option<SiteRecord>> {
        let sql = format!("{SITE_SELECT_SQL} WHERE site_id = ?");
        let tx = self.conn.unchecked_transaction()?;
        let mut records = load_records(&tx, &sql, vec![Value::Text(site_id.to_string())])?;
        tx.commit()?;
        Ok(records.pop())
    }

    fn site_exists(&self, site_id: &str) -> RepoResult<bool> {
        site_exists(self.conn, site_id)
    }

    fn insert_site(&self, site: &Site) -> RepoResult<()> {
        site.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        if site_exists(&tx, &site.site_id)? {
            return Err(RepoError::Conflict {
                entity: "site",
                id: site.site_id.clone(),
            });
        }

        let shape_json = site
            .shape
            .to_json()
            .map_err(|err| RepoError::InvalidData(format!("unserializable shape: {err}")))?;
        tx.execute(
            "INSERT INTO sites (
                site_id,
                site_name,
                addr_street1,
                addr_street2,
                addr_city,
                addr_county,
                addr_state,
                addr_zip,
                shape_json,
                sector,
                carcinogen,
                substrate_type,
                total_releases
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                site.site_id.as_str(),
                site.site_name.as_str(),
                site.address.street1.as_str(),
                site.address.street2.as_deref(),
                site.address.city.as_str(),
                site.address.county.as_deref(),
                site.address.state.trim().to_ascii_uppercase(),
                site.address.zip.as_str(),
                shape_json,
                site.sector.as_deref(),
                site.carcinogen.map(bool_to_int),
                site.substrate_type.as_deref(),
                site.total_releases,
            ],
        )?;

        for release_type in &site.release_types {
            tx.execute(
                "INSERT OR IGNORE INTO site_release_types (site_id, release_type)
                 VALUES (?1, ?2);",
                params![
                    site.site_id.as_str(),
                    release_type.trim().to_ascii_uppercase()
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn put_attribute_group(&self, site_id: &str, group: &AttributeGroup) -> RepoResult<()> {
        if !site_exists(self.conn, site_id)? {
            return Err(RepoError::not_found("site", site_id));
        }

        let fields: Vec<(&'static str, Option<u32>)> = group.iter().collect();
        let columns = fields
            .iter()
            .map(|(field, _)| *field)
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} (site_id, {columns}) VALUES ({});",
            group.category().as_str(),
            placeholders(fields.len() + 1)
        );

        let mut bind_values = vec![Value::Text(site_id.to_string())];
        bind_values.extend(fields.iter().map(|(_, value)| match value {
            Some(count) => Value::Integer(i64::from(*count)),
            None => Value::Null,
        }));
        self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(())
    }
}

pub(crate) fn site_exists(conn: &Connection, site_id: &str) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sites WHERE site_id = ?1);",
        [site_id],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(exists == 1)
}

/// Runs a site select and eager-loads every related row for the result set.
fn load_records(conn: &Connection, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<SiteRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(SiteRecord::new(parse_site_row(row)?));
    }
    drop(rows);

    if records.is_empty() {
        return Ok(records);
    }

    let positions: HashMap<SiteId, usize> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| (record.site_id().to_string(), idx))
        .collect();
    let site_ids: Vec<SiteId> = records
        .iter()
        .map(|record| record.site_id().to_string())
        .collect();

    for chunk in site_ids.chunks(IN_CLAUSE_CHUNK) {
        for (site_id, release_type) in load_release_types(conn, chunk)? {
            if let Some(&idx) = positions.get(&site_id) {
                records[idx].site.release_types.push(release_type);
            }
        }

        for category in AttributeCategory::ALL {
            for (site_id, group) in load_attribute_groups(conn, category, chunk)? {
                if let Some(&idx) = positions.get(&site_id) {
                    records[idx].set_attribute_group(group);
                }
            }
        }

        for report in load_reports(conn, chunk)? {
            if let Some(&idx) = positions.get(&report.site_id) {
                records[idx].reports.push(report);
            }
        }

        for review in load_reviews(conn, chunk)? {
            if let Some(&idx) = positions.get(&review.site_id) {
                records[idx].reviews.push(review);
            }
        }
    }

    Ok(records)
}

fn load_release_types(conn: &Connection, site_ids: &[SiteId]) -> RepoResult<Vec<(SiteId, String)>> {
    let sql = format!(
        "SELECT site_id, release_type
         FROM site_release_types
         WHERE site_id IN ({})
         ORDER BY site_id ASC, release_type ASC;",
        placeholders(site_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(site_ids.iter()), |row| {
        Ok((row.get("site_id")?, row.get("release_type")?))
    })?;

    let mut pairs = Vec::new();
    for row in rows {
        pairs.push(row?);
    }
    Ok(pairs)
}

fn load_attribute_groups(
    conn: &Connection,
    category: AttributeCategory,
    site_ids: &[SiteId],
) -> RepoResult<Vec<(SiteId, AttributeGroup)>> {
    let sql = format!(
        "SELECT site_id, {} FROM {} WHERE site_id IN ({});",
        category.field_names().join(", "),
        category.as_str(),
        placeholders(site_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(site_ids.iter()))?;

    let mut groups = Vec::new();
    while let Some(row) = rows.next()? {
        let site_id: SiteId = row.get("site_id")?;
        let mut group = AttributeGroup::new(category);
        for field in category.field_names() {
            let raw: Option<i64> = row.get(*field)?;
            let value = raw
                .map(|count| {
                    u32::try_from(count).map_err(|_| {
                        RepoError::InvalidData(format!(
                            "{category}.{field} has invalid count {count} for site {site_id}"
                        ))
                    })
                })
                .transpose()?;
            group
                .set(field, value)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        }
        groups.push((site_id, group));
    }
    Ok(groups)
}

fn parse_site_row(row: &Row<'_>) -> RepoResult<Site> {
    let site_id: String = row.get("site_id")?;
    let shape_json: String = row.get("shape_json")?;
    let shape = SiteShape::from_json(&shape_json)
        .map_err(|err| RepoError::InvalidData(format!("site {site_id} has invalid shape: {err}")))?;
    let carcinogen = match row.get::<_, Option<i64>>("carcinogen")? {
        None => None,
        Some(0) => Some(false),
        Some(1) => Some(true),
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "site {site_id} has invalid carcinogen flag {other}"
            )));
        }
    };

    Ok(Site {
        site_name: row.get("site_name")?,
        address: Address {
            street1: row.get("addr_street1")?,
            street2: row.get("addr_street2")?,
            city: row.get("addr_city")?,
            county: row.get("addr_county")?,
            state: row.get("addr_state")?,
            zip: row.get("addr_zip")?,
        },
        shape,
        sector: row.get("sector")?,
        carcinogen,
        release_types: Vec::new(),
        total_releases: row.get("total_releases")?,
        substrate_type: row.get("substrate_type")?,
        site_id,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{RepoError, SiteRepository, SqliteSiteRepository};
    use crate::db::open_db_in_memory;
    use crate::model::attributes::{AttributeCategory, AttributeGroup};
    use crate::model::site::{Address, Site, SiteShape};

    fn site(id: &str) -> Site {
        let mut site = Site::new(
            id,
            "Acme Plant",
            Address {
                street1: "1 River Rd".to_string(),
                city: "Duluth".to_string(),
                state: "mn".to_string(),
                zip: "05802".to_string(),
                ..Address::default()
            },
            SiteShape::point(-92.1, 46.8),
        );
        site.release_types = vec!["water".to_string(), "AIR".to_string()];
        site.carcinogen = Some(true);
        site
    }

    #[test]
    fn insert_then_get_round_trips_site_and_related_rows() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSiteRepository::new(&conn);
        repo.insert_site(&site("TRI-1")).unwrap();
        repo.put_attribute_group(
            "TRI-1",
            &AttributeGroup::new(AttributeCategory::Amenities)
                .with("benches", 2)
                .unwrap(),
        )
        .unwrap();

        let record = repo.get_site("TRI-1").unwrap().expect("site should exist");
        assert_eq!(record.site.address.state, "MN");
        assert_eq!(record.site.address.zip, "05802");
        assert_eq!(record.site.release_types, vec!["AIR", "WATER"]);
        assert_eq!(record.site.carcinogen, Some(true));
        assert_eq!(record.amenities.as_ref().and_then(|g| g.value("benches")), Some(2));
        assert!(record.equipment.is_none());
    }

    #[test]
    fn duplicate_site_id_is_a_conflict() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSiteRepository::new(&conn);
        repo.insert_site(&site("TRI-1")).unwrap();
        let err = repo.insert_site(&site("TRI-1")).unwrap_err();
        assert!(matches!(err, RepoError::Conflict { entity: "site", .. }));
    }

    #[test]
    fn attribute_group_for_unknown_site_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSiteRepository::new(&conn);
        let err = repo
            .put_attribute_group("nope", &AttributeGroup::new(AttributeCategory::Equipment))
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound { entity: "site", .. }));
    }

    #[test]
    fn invalid_site_is_rejected_before_sql() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSiteRepository::new(&conn);
        let mut invalid = site("TRI-2");
        invalid.site_name = "  ".to_string();
        assert!(matches!(
            repo.insert_site(&invalid),
            Err(RepoError::Validation(_))
        ));
        assert!(!repo.site_exists("TRI-2").unwrap());
    }

    #[test]
    fn corrupt_shape_is_reported_as_invalid_data() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSiteRepository::new(&conn);
        repo.insert_site(&site("TRI-3")).unwrap();
        conn.execute(
            "UPDATE sites SET shape_json = '{\"type\":\"Circle\"}' WHERE site_id = 'TRI-3';",
            [],
        )
        .unwrap();
        assert!(matches!(
            repo.get_site("TRI-3"),
            Err(RepoError::InvalidData(_))
        ));
    }
}
