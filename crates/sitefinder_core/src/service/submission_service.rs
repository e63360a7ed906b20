//! Report/review submission use-case.
//!
//! # Responsibility
//! - Authorize the caller, validate the payload and persist it.
//! - Return the refreshed site so hosts can render the new state directly.
//!
//! # Invariants
//! - The stored `user_email` is the authorized identity, never a payload field.
//! - `EQUIPMENT_ISSUE` equipment names are canonical equipment schema fields.
//! - Comments are trimmed; blank comments are stored as absent.

use crate::model::report::{NewReport, NewReview, Report, Review, MAX_STARS, MIN_STARS};
use crate::model::site::SiteRecord;
use crate::model::user::Caller;
use crate::repo::site_repo::SiteRepository;
use crate::repo::submission_repo::SubmissionRepository;
use crate::repo::user_repo::CredentialStore;
use crate::service::{authorize, now_ms, ServiceError, ServiceResult};
use log::info;
use std::time::Instant;
use uuid::Uuid;

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// Submission facade over credential, site and submission repositories.
pub struct SubmissionService<C, S, W>
where
    C: CredentialStore,
    S: SiteRepository,
    W: SubmissionRepository,
{
    credentials: C,
    sites: S,
    submissions: W,
}

impl<C, S, W> SubmissionService<C, S, W>
where
    C: CredentialStore,
    S: SiteRepository,
    W: SubmissionRepository,
{
    pub fn new(credentials: C, sites: S, submissions: W) -> Self {
        Self {
            credentials,
            sites,
            submissions,
        }
    }

    pub fn submit_report(&self, caller: &Caller, report: NewReport) -> ServiceResult<SiteRecord> {
        let started_at = Instant::now();
        let user_email = authorize(&self.credentials, caller)?;
        let site_id = normalize_site_id(&report.site_id)?;
        let kind = report.kind.normalized()?;

        let report = Report {
            report_id: Uuid::new_v4(),
            site_id,
            user_email,
            kind,
            comment: normalize_comment(report.comment)?,
            created_at: now_ms(),
        };
        self.submissions.insert_report(&report)?;
        info!(
            "event=submit_report module=service status=ok report_type={} duration_ms={}",
            report.kind.as_db_str(),
            started_at.elapsed().as_millis()
        );

        self.refreshed_site(&report.site_id)
    }

    pub fn submit_review(&self, caller: &Caller, review: NewReview) -> ServiceResult<SiteRecord> {
        let started_at = Instant::now();
        let user_email = authorize(&self.credentials, caller)?;
        let site_id = normalize_site_id(&review.site_id)?;
        if !(MIN_STARS..=MAX_STARS).contains(&review.stars) {
            return Err(ServiceError::invalid(format!(
                "stars must be within {MIN_STARS}..={MAX_STARS}, got {}",
                review.stars
            )));
        }

        let review = Review {
            review_id: Uuid::new_v4(),
            site_id,
            user_email,
            stars: review.stars,
            comment: normalize_comment(review.comment)?,
            created_at: now_ms(),
        };
        self.submissions.insert_review(&review)?;
        info!(
            "event=submit_review module=service status=ok stars={} duration_ms={}",
            review.stars,
            started_at.elapsed().as_millis()
        );

        self.refreshed_site(&review.site_id)
    }

    fn refreshed_site(&self, site_id: &str) -> ServiceResult<SiteRecord> {
        self.sites
            .get_site(site_id)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "site",
                id: site_id.to_string(),
            })
    }
}

fn normalize_site_id(site_id: &str) -> ServiceResult<String> {
    let trimmed = site_id.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid("site_id must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn normalize_comment(comment: Option<String>) -> ServiceResult<Option<String>> {
    let Some(comment) = comment else {
        return Ok(None);
    };
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_COMMENT_CHARS {
        return Err(ServiceError::invalid(format!(
            "comment is {chars} characters, limit is {MAX_COMMENT_CHARS}"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{normalize_comment, MAX_COMMENT_CHARS};
    use crate::error::ErrorKind;

    #[test]
    fn blank_comment_is_absent() {
        assert_eq!(normalize_comment(Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            normalize_comment(Some(" swing chain snapped ".to_string())).unwrap(),
            Some("swing chain snapped".to_string())
        );
    }

    #[test]
    fn overlong_comment_is_invalid() {
        let err = normalize_comment(Some("x".repeat(MAX_COMMENT_CHARS + 1))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubmission);
        assert!(normalize_comment(Some("é".repeat(MAX_COMMENT_CHARS))).is_ok());
    }
}
