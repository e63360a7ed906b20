//! Spatial query filter engine.
//!
//! # Responsibility
//! - Turn request parameters into a proximity predicate plus composed
//!   attribute predicates that the store evaluates in one fetch.
//! - Refine fetched candidates in memory for per-category flag requests.
//!
//! # Invariants
//! - Parameter and attribute-name errors surface before any store call.
//! - Absent filters impose no constraint.
//! - Set-membership filters are OR across values; requested flags are AND.
//! - The engine holds no state across calls.

use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::attributes::UnknownAttributeError;
use crate::repo::site_repo::RepoError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod compose;
pub mod params;
pub mod proximity;
pub mod refine;

pub type QueryResult<T> = Result<T, QueryError>;

/// Query engine error.
#[derive(Debug)]
pub enum QueryError {
    InvalidQueryParameter { name: &'static str, reason: String },
    UnknownAttributeName(UnknownAttributeError),
    /// Store could not be reached; the repository error is kept unchanged.
    StoreUnavailable(RepoError),
    /// Statement failed or returned rows that do not decode.
    StoreQueryFailed(RepoError),
}

impl QueryError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidQueryParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQueryParameter { .. } => ErrorKind::InvalidQueryParameter,
            Self::UnknownAttributeName(_) => ErrorKind::UnknownAttributeName,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::StoreQueryFailed(_) => ErrorKind::StoreQueryFailed,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind().is_client_error()
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQueryParameter { name, reason } => {
                write!(f, "invalid query parameter `{name}`: {reason}")
            }
            Self::UnknownAttributeName(err) => write!(f, "{err}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::StoreQueryFailed(err) => write!(f, "store query failed: {err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQueryParameter { .. } => None,
            Self::UnknownAttributeName(err) => Some(err),
            Self::StoreUnavailable(err) | Self::StoreQueryFailed(err) => Some(err),
        }
    }
}

impl From<UnknownAttributeError> for QueryError {
    fn from(value: UnknownAttributeError) -> Self {
        Self::UnknownAttributeName(value)
    }
}

impl From<RepoError> for QueryError {
    fn from(value: RepoError) -> Self {
        if is_store_unavailable(&value) {
            Self::StoreUnavailable(value)
        } else {
            Self::StoreQueryFailed(value)
        }
    }
}

/// Whether the store itself could not be used, as opposed to one statement failing.
pub(crate) fn is_store_unavailable(err: &RepoError) -> bool {
    match err {
        RepoError::Db(DbError::UnsupportedSchemaVersion { .. }) => true,
        RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))) => matches!(
            failure.code,
            ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
                | ErrorCode::FileLockingProtocolFailed
                | ErrorCode::OutOfMemory
        ),
        _ => false,
    }
}
