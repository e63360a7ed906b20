//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep hosts (HTTP adapters, CLI) decoupled from storage details.
//! - Gate write paths behind caller authorization.
//!
//! # Invariants
//! - Authorization happens before any validation or store write.
//! - Authorization failures never reveal whether the identity exists.

use crate::error::ErrorKind;
use crate::model::attributes::UnknownAttributeError;
use crate::model::user::Caller;
use crate::query::is_store_unavailable;
use crate::repo::user_repo::CredentialStore;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod favorites_service;
pub mod query_service;
pub mod submission_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error for submission and favorites use-cases.
#[derive(Debug)]
pub enum ServiceError {
    NotAuthorized,
    InvalidSubmission(String),
    UnknownAttributeName(UnknownAttributeError),
    NotFound { entity: &'static str, id: String },
    Conflict { entity: &'static str, id: String },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidSubmission(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized => ErrorKind::NotAuthorized,
            Self::InvalidSubmission(_) => ErrorKind::InvalidSubmission,
            Self::UnknownAttributeName(_) => ErrorKind::UnknownAttributeName,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Repo(err) if is_store_unavailable(err) => ErrorKind::StoreUnavailable,
            Self::Repo(_) => ErrorKind::StoreQueryFailed,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind().is_client_error()
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized => write!(f, "not authorized"),
            Self::InvalidSubmission(message) => write!(f, "invalid submission: {message}"),
            Self::UnknownAttributeName(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { entity, id } => write!(f, "{entity} already exists: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownAttributeName(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnknownAttributeError> for ServiceError {
    fn from(value: UnknownAttributeError) -> Self {
        Self::UnknownAttributeName(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict { entity, id } => Self::Conflict { entity, id },
            other => Self::Repo(other),
        }
    }
}

/// Resolves the caller against `store`; returns the canonical identity.
pub(crate) fn authorize<C: CredentialStore + ?Sized>(
    store: &C,
    caller: &Caller,
) -> ServiceResult<String> {
    match store.lookup(&caller.identity)? {
        Some(credentials) if credentials.matches(&caller.access_token) => {
            Ok(credentials.identity)
        }
        _ => Err(ServiceError::NotAuthorized),
    }
}

/// Current Unix epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
