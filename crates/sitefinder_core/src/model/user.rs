//! User accounts, credentials and request callers.

use crate::model::site::SiteId;
use serde::{Deserialize, Serialize};

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Favorite site ids, sorted.
    pub favorite_sites: Vec<SiteId>,
}

/// Payload for account creation. Token issuance happens outside core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub access_token: String,
}

/// Known-good credentials returned by a credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub access_token: String,
}

impl Credentials {
    /// Compares tokens without short-circuiting on the first differing byte.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.access_token.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Identity and token presented by the host for a gated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub identity: String,
    pub access_token: String,
}

impl Caller {
    pub fn new(identity: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            access_token: access_token.into(),
        }
    }
}

/// Favorites mutation requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteOp {
    Add,
    Remove,
}

impl FavoriteOp {
    /// Parses the `operation` query value (`add` / `remove`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Credentials, FavoriteOp};

    #[test]
    fn credentials_match_only_exact_token() {
        let credentials = Credentials {
            identity: "jo@example.com".to_string(),
            access_token: "token-123".to_string(),
        };
        assert!(credentials.matches("token-123"));
        assert!(!credentials.matches("token-124"));
        assert!(!credentials.matches("token-1234"));
        assert!(!credentials.matches(""));
    }

    #[test]
    fn favorite_op_parses_known_values() {
        assert_eq!(FavoriteOp::parse(" ADD "), Some(FavoriteOp::Add));
        assert_eq!(FavoriteOp::parse("remove"), Some(FavoriteOp::Remove));
        assert_eq!(FavoriteOp::parse("toggle"), None);
    }
}
