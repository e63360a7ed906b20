//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes validate their input before any SQL mutation.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.
//! - Reads reject invalid persisted state instead of masking it.

pub mod site_repo;
pub mod submission_repo;
pub mod user_repo;

pub use site_repo::{RepoError, RepoResult};

/// Upper bound of ids bound into one `IN (...)` list.
pub(crate) const IN_CLAUSE_CHUNK: usize = 500;

/// `?, ?, ?` with `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn parse_uuid(value: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid uuid `{value}`: {err}")))
}
