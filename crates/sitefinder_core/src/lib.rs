//! Core domain logic for SiteFinder, a "sites near me" query engine.
//! This crate is the single source of truth for query and filter semantics.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod projection;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_busy_timeout, DbError, DbResult};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::attributes::{AttributeCategory, AttributeGroup, UnknownAttributeError};
pub use model::report::{NewReport, NewReview, Report, ReportKind, Review};
pub use model::site::{Address, Site, SiteId, SiteRecord, SiteShape, SiteValidationError};
pub use model::user::{Caller, Credentials, FavoriteOp, NewUser, UserAccount};
pub use projection::{FeatureCollection, SiteFeature};
pub use query::params::{miles_to_meters, RequestedFlags, SiteQuery};
pub use query::{QueryError, QueryResult};
pub use repo::site_repo::{SiteRepository, SqliteSiteRepository};
pub use repo::submission_repo::{SqliteSubmissionRepository, SubmissionRepository};
pub use repo::user_repo::{
    CredentialStore, InMemoryCredentialStore, SqliteUserRepository, UserRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::favorites_service::FavoritesService;
pub use service::query_service::SiteQueryService;
pub use service::submission_service::SubmissionService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
