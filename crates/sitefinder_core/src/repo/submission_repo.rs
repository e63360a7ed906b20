//! Report/review persistence.
//!
//! # Invariants
//! - `EQUIPMENT_ISSUE` rows always carry an equipment name and no other
//!   report type does; the schema CHECK backs this up.
//! - Rows are listed oldest first, ties broken by id.

use crate::model::report::{Report, ReportKind, Review};
use crate::model::site::SiteId;
use crate::repo::site_repo::site_exists;
use crate::repo::{parse_uuid, placeholders, RepoError, RepoResult};
use rusqlite::{params, params_from_iter, Connection, Row};

/// Repository interface for user submissions.
pub trait SubmissionRepository {
    fn insert_report(&self, report: &Report) -> RepoResult<()>;
    fn insert_review(&self, review: &Review) -> RepoResult<()>;
}

/// SQLite-backed submission repository.
pub struct SqliteSubmissionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubmissionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SubmissionRepository for SqliteSubmissionRepository<'_> {
    fn insert_report(&self, report: &Report) -> RepoResult<()> {
        if !site_exists(self.conn, &report.site_id)? {
            return Err(RepoError::not_found("site", report.site_id.as_str()));
        }

        self.conn.execute(
            "INSERT INTO reports (
                report_id,
                site_id,
                user_email,
                report_type,
                equipment,
                comment,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                report.report_id.to_string(),
                report.site_id.as_str(),
                report.user_email.as_str(),
                report.kind.as_db_str(),
                report.kind.equipment(),
                report.comment.as_deref(),
                report.created_at,
            ],
        )?;
        Ok(())
    }

    fn insert_review(&self, review: &Review) -> RepoResult<()> {
        if !site_exists(self.conn, &review.site_id)? {
            return Err(RepoError::not_found("site", review.site_id.as_str()));
        }

        self.conn.execute(
            "INSERT INTO reviews (
                review_id,
                site_id,
                user_email,
                stars,
                comment,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                review.review_id.to_string(),
                review.site_id.as_str(),
                review.user_email.as_str(),
                i64::from(review.stars),
                review.comment.as_deref(),
                review.created_at,
            ],
        )?;
        Ok(())
    }
}

pub(crate) fn load_reports(conn: &Connection, site_ids: &[SiteId]) -> RepoResult<Vec<Report>> {
    let sql = format!(
        "SELECT report_id, site_id, user_email, report_type, equipment, comment, created_at
         FROM reports
         WHERE site_id IN ({})
         ORDER BY created_at ASC, report_id ASC;",
        placeholders(site_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(site_ids.iter()))?;
    let mut reports = Vec::new();
    while let Some(row) = rows.next()? {
        reports.push(parse_report_row(row)?);
    }
    Ok(reports)
}

pub(crate) fn load_reviews(conn: &Connection, site_ids: &[SiteId]) -> RepoResult<Vec<Review>> {
    let sql = format!(
        "SELECT review_id, site_id, user_email, stars, comment, created_at
         FROM reviews
         WHERE site_id IN ({})
         ORDER BY created_at ASC, review_id ASC;",
        placeholders(site_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(site_ids.iter()))?;
    let mut reviews = Vec::new();
    while let Some(row) = rows.next()? {
        reviews.push(parse_review_row(row)?);
    }
    Ok(reviews)
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<Report> {
    let report_id: String = row.get("report_id")?;
    let tag: String = row.get("report_type")?;
    let kind = ReportKind::from_db(&tag, row.get("equipment")?)
        .map_err(|err| RepoError::InvalidData(format!("report {report_id}: {err}")))?;

    Ok(Report {
        report_id: parse_uuid(&report_id)?,
        site_id: row.get("site_id")?,
        user_email: row.get("user_email")?,
        kind,
        comment: row.get("comment")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    let review_id: String = row.get("review_id")?;
    let stars: i64 = row.get("stars")?;
    let stars = u8::try_from(stars)
        .map_err(|_| RepoError::InvalidData(format!("review {review_id}: invalid stars {stars}")))?;

    Ok(Review {
        review_id: parse_uuid(&review_id)?,
        site_id: row.get("site_id")?,
        user_email: row.get("user_email")?,
        stars,
        comment: row.get("comment")?,
        created_at: row.get("created_at")?,
    })
}
