//! Domain model for located sites and their related records.
//!
//! # Responsibility
//! - Define canonical data structures consumed by the query engine.
//! - Keep storage concerns (tables, columns) out of the model.
//!
//! # Invariants
//! - Every site is identified by a stable `SiteId`.
//! - 0..1 relationships are `Option`, 0..n relationships are `Vec`.

pub mod attributes;
pub mod report;
pub mod site;
pub mod user;
