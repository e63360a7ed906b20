//! Site query use-case.
//!
//! # Responsibility
//! - Run validate, compose, fetch and refine for one request.
//! - Emit one structured log event per query with counts and timing.
//!
//! # Invariants
//! - Exactly one store read per query; nothing is retried.
//! - Validation errors are returned before the repository is called.
//! - Log lines carry metadata only (radius, counts), never free text input.

use crate::model::site::SiteRecord;
use crate::projection::FeatureCollection;
use crate::query::compose::compose;
use crate::query::params::SiteQuery;
use crate::query::refine::refine;
use crate::query::{QueryError, QueryResult};
use crate::repo::site_repo::SiteRepository;
use geo::Point;
use log::{error, info, warn};
use std::time::Instant;

/// Site query facade over repository implementations.
pub struct SiteQueryService<R: SiteRepository> {
    repo: R,
}

impl<R: SiteRepository> SiteQueryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns every site within the radius that passes all filters,
    /// ordered by `site_id`.
    pub fn query(&self, query: &SiteQuery) -> QueryResult<Vec<SiteRecord>> {
        let started_at = Instant::now();
        let composed = match compose(query) {
            Ok(composed) => composed,
            Err(err) => {
                warn!(
                    "event=site_query module=query status=rejected error_code={} error={}",
                    err.kind().as_str(),
                    err
                );
                return Err(err);
            }
        };

        let candidates = match self.repo.fetch_sites(&composed) {
            Ok(candidates) => candidates,
            Err(err) => {
                let err = QueryError::from(err);
                error!(
                    "event=site_query module=query status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.kind().as_str(),
                    err
                );
                return Err(err);
            }
        };

        let candidate_count = candidates.len();
        let records = refine(candidates, &composed.refinement);
        info!(
            "event=site_query module=query status=ok radius_m={} filtered={} candidates={} returned={} duration_ms={}",
            composed.proximity.radius_meters(),
            query.has_filters(),
            candidate_count,
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    /// Looks up one site by id, with the same store error classification as
    /// [`SiteQueryService::query`].
    pub fn site(&self, site_id: &str) -> QueryResult<Option<SiteRecord>> {
        self.repo.get_site(site_id).map_err(|err| {
            let err = QueryError::from(err);
            error!(
                "event=site_lookup module=query status=error error_code={} error={}",
                err.kind().as_str(),
                err
            );
            err
        })
    }

    /// [`SiteQueryService::query`] projected to GeoJSON, with distances
    /// from the query point.
    pub fn query_features(&self, query: &SiteQuery) -> QueryResult<FeatureCollection> {
        let records = self.query(query)?;
        let origin = Point::new(query.longitude, query.latitude);
        Ok(FeatureCollection::from_records(&records, Some(origin)))
    }
}
