//! Cross-layer error classification.
//!
//! Every public error type in core maps onto one [`ErrorKind`] so hosts can
//! pick a response status without matching on layer-specific variants.

use serde::Serialize;

/// Stable error classification exposed to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range query parameter. Raised before any store call.
    InvalidQueryParameter,
    /// Requested attribute flag name is not part of its category schema.
    UnknownAttributeName,
    /// Store could not be reached (open, lock, I/O).
    StoreUnavailable,
    /// Store was reachable but the statement failed or returned invalid data.
    StoreQueryFailed,
    /// Caller identity/token did not match stored credentials.
    NotAuthorized,
    /// Write-path payload failed validation.
    InvalidSubmission,
    /// Referenced entity does not exist.
    NotFound,
    /// Entity already exists.
    Conflict,
}

impl ErrorKind {
    /// Stable snake_case id, used in log lines and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidQueryParameter => "invalid_query_parameter",
            Self::UnknownAttributeName => "unknown_attribute_name",
            Self::StoreUnavailable => "store_unavailable",
            Self::StoreQueryFailed => "store_query_failed",
            Self::NotAuthorized => "not_authorized",
            Self::InvalidSubmission => "invalid_submission",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
        }
    }

    /// Whether the failure is attributable to the request rather than the store.
    pub fn is_client_error(self) -> bool {
        !matches!(self, Self::StoreUnavailable | Self::StoreQueryFailed)
    }
}
