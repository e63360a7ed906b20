//! Account and favorites use-case.
//!
//! # Responsibility
//! - Create accounts with validated emails and names.
//! - List and modify the authorized caller's favorite sites.
//!
//! # Invariants
//! - Favorites are only ever read or written for the authorized identity.
//! - Adding an existing favorite is idempotent; removing a missing one is
//!   `NotFound`.

use crate::model::user::{Caller, FavoriteOp, NewUser, UserAccount};
use crate::repo::user_repo::UserRepository;
use crate::service::{authorize, ServiceError, ServiceResult};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Favorites facade over a user repository.
pub struct FavoritesService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> FavoritesService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an account and returns its public view.
    pub fn create_user(&self, user: NewUser) -> ServiceResult<UserAccount> {
        let user = NewUser {
            email: user.email.trim().to_string(),
            first_name: user.first_name.trim().to_string(),
            last_name: user.last_name.trim().to_string(),
            access_token: user.access_token,
        };
        if !EMAIL_RE.is_match(&user.email) {
            return Err(ServiceError::invalid(format!(
                "`{}` is not an email address",
                user.email
            )));
        }
        if user.first_name.is_empty() || user.last_name.is_empty() {
            return Err(ServiceError::invalid("first_name and last_name are required"));
        }
        if user.access_token.trim().is_empty() {
            return Err(ServiceError::invalid("access_token must not be blank"));
        }

        self.repo.create_user(&user)?;
        info!("event=user_create module=service status=ok");
        self.account(&user.email)
    }

    pub fn list_favorites(&self, caller: &Caller) -> ServiceResult<Vec<String>> {
        let identity = authorize(&self.repo, caller)?;
        Ok(self.repo.list_favorites(&identity)?)
    }

    /// Applies `op` and returns the updated account.
    pub fn modify_favorites(
        &self,
        caller: &Caller,
        op: FavoriteOp,
        site_id: &str,
    ) -> ServiceResult<UserAccount> {
        let identity = authorize(&self.repo, caller)?;
        let site_id = site_id.trim();
        if site_id.is_empty() {
            return Err(ServiceError::invalid("site_id must not be blank"));
        }

        match op {
            FavoriteOp::Add => self.repo.add_favorite(&identity, site_id)?,
            FavoriteOp::Remove => self.repo.remove_favorite(&identity, site_id)?,
        }
        info!("event=favorites_modify module=service status=ok op={op:?}");
        self.account(&identity)
    }

    fn account(&self, email: &str) -> ServiceResult<UserAccount> {
        self.repo
            .get_user(email)?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "user",
                id: email.to_string(),
            })
    }
}
