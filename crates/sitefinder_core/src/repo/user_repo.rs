//! User accounts, credentials and favorites.
//!
//! # Responsibility
//! - Look up stored credentials for caller authorization.
//! - Persist accounts and their favorite-site links.
//!
//! # Invariants
//! - Emails compare case-insensitively (`COLLATE NOCASE` in storage,
//!   lowercase keys in memory).
//! - A favorite link always references an existing user and site.

use crate::model::site::SiteId;
use crate::model::user::{Credentials, NewUser, UserAccount};
use crate::repo::site_repo::site_exists;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;

/// Source of known-good credentials, keyed by identity.
pub trait CredentialStore {
    fn lookup(&self, identity: &str) -> RepoResult<Option<Credentials>>;
}

/// Fixed credential table, for hosts that provision tokens out of band.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    tokens: HashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: &str, access_token: impl Into<String>) {
        self.tokens
            .insert(identity.trim().to_lowercase(), access_token.into());
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self, identity: &str) -> RepoResult<Option<Credentials>> {
        let key = identity.trim().to_lowercase();
        Ok(self.tokens.get(&key).map(|token| Credentials {
            identity: key.clone(),
            access_token: token.clone(),
        }))
    }
}

/// Repository interface for accounts and favorites.
pub trait UserRepository: CredentialStore {
    /// Stores a new account; an existing email is a conflict.
    fn create_user(&self, user: &NewUser) -> RepoResult<()>;
    fn get_user(&self, email: &str) -> RepoResult<Option<UserAccount>>;
    /// Adding an existing favorite is a no-op.
    fn add_favorite(&self, email: &str, site_id: &str) -> RepoResult<()>;
    /// Removing a favorite that is not present is `NotFound`.
    fn remove_favorite(&self, email: &str, site_id: &str) -> RepoResult<()>;
    fn list_favorites(&self, email: &str) -> RepoResult<Vec<SiteId>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_user(&self, email: &str) -> RepoResult<()> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1);",
            [email],
            |row| row.get::<_, i64>(0),
        )?;
        if exists == 1 {
            Ok(())
        } else {
            Err(RepoError::not_found("user", email))
        }
    }
}

impl CredentialStore for SqliteUserRepository<'_> {
    fn lookup(&self, identity: &str) -> RepoResult<Option<Credentials>> {
        let credentials = self
            .conn
            .query_row(
                "SELECT email, access_token FROM users WHERE email = ?1;",
                [identity.trim()],
                |row| {
                    Ok(Credentials {
                        identity: row.get("email")?,
                        access_token: row.get("access_token")?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<()> {
        let email = user.email.trim();
        let inserted = self.conn.execute(
            "INSERT INTO users (email, first_name, last_name, access_token)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                email,
                user.first_name.trim(),
                user.last_name.trim(),
                user.access_token.as_str(),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Conflict {
                    entity: "user",
                    id: email.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_user(&self, email: &str) -> RepoResult<Option<UserAccount>> {
        let account = self
            .conn
            .query_row(
                "SELECT email, first_name, last_name FROM users WHERE email = ?1;",
                [email.trim()],
                |row| {
                    Ok(UserAccount {
                        email: row.get("email")?,
                        first_name: row.get("first_name")?,
                        last_name: row.get("last_name")?,
                        favorite_sites: Vec::new(),
                    })
                },
            )
            .optional()?;

        match account {
            Some(mut account) => {
                account.favorite_sites = self.list_favorites(&account.email)?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    fn add_favorite(&self, email: &str, site_id: &str) -> RepoResult<()> {
        self.ensure_user(email)?;
        if !site_exists(self.conn, site_id)? {
            return Err(RepoError::not_found("site", site_id));
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO user_favorites (user_email, site_id)
             SELECT email, ?2 FROM users WHERE email = ?1;",
            params![email, site_id],
        )?;
        Ok(())
    }

    fn remove_favorite(&self, email: &str, site_id: &str) -> RepoResult<()> {
        self.ensure_user(email)?;
        let removed = self.conn.execute(
            "DELETE FROM user_favorites
             WHERE user_email = ?1 COLLATE NOCASE
               AND site_id = ?2;",
            params![email, site_id],
        )?;
        if removed == 0 {
            return Err(RepoError::not_found("favorite", site_id));
        }
        Ok(())
    }

    fn list_favorites(&self, email: &str) -> RepoResult<Vec<SiteId>> {
        let mut stmt = self.conn.prepare(
            "SELECT site_id
             FROM user_favorites
             WHERE user_email = ?1 COLLATE NOCASE
             ORDER BY site_id ASC;",
        )?;
        let rows = stmt.query_map([email], |row| row.get::<_, String>(0))?;

        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }
        Ok(favorites)
    }
}
