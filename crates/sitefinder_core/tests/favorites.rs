mod common;

use common::seed;
use sitefinder_core::db::open_db_in_memory;
use sitefinder_core::{Caller, ErrorKind, FavoriteOp, FavoritesService, NewUser, SqliteUserRepository};

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        first_name: "Sam".to_string(),
        last_name: "Rivera".to_string(),
        access_token: "sam-token".to_string(),
    }
}

#[test]
fn create_user_returns_account_without_favorites() {
    let conn = open_db_in_memory().unwrap();
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));

    let account = service.create_user(new_user(" sam@example.com ")).unwrap();
    assert_eq!(account.email, "sam@example.com");
    assert_eq!(account.first_name, "Sam");
    assert!(account.favorite_sites.is_empty());
}

#[test]
fn duplicate_email_is_a_conflict_regardless_of_case() {
    let conn = open_db_in_memory().unwrap();
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));

    service.create_user(new_user("sam@example.com")).unwrap();
    let err = service.create_user(new_user("SAM@example.com")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn malformed_account_payload_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));

    let err = service.create_user(new_user("not-an-email")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSubmission);

    let mut nameless = new_user("sam@example.com");
    nameless.last_name = " ".to_string();
    let err = service.create_user(nameless).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSubmission);
}

#[test]
fn favorites_add_is_idempotent_and_listed_sorted() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));
    service.create_user(new_user("sam@example.com")).unwrap();
    let caller = Caller::new("sam@example.com", "sam-token");

    service
        .modify_favorites(&caller, FavoriteOp::Add, "PG-2")
        .unwrap();
    service
        .modify_favorites(&caller, FavoriteOp::Add, "PG-1")
        .unwrap();
    let account = service
        .modify_favorites(&caller, FavoriteOp::Add, "PG-2")
        .unwrap();

    assert_eq!(account.favorite_sites, vec!["PG-1", "PG-2"]);
    assert_eq!(service.list_favorites(&caller).unwrap(), vec!["PG-1", "PG-2"]);
}

#[test]
fn favorites_remove_requires_existing_link() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));
    service.create_user(new_user("sam@example.com")).unwrap();
    let caller = Caller::new("Sam@Example.com", "sam-token");

    service
        .modify_favorites(&caller, FavoriteOp::Add, "TRI-001")
        .unwrap();
    let account = service
        .modify_favorites(&caller, FavoriteOp::Remove, "TRI-001")
        .unwrap();
    assert!(account.favorite_sites.is_empty());

    let err = service
        .modify_favorites(&caller, FavoriteOp::Remove, "TRI-001")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn favorite_for_unknown_site_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));
    service.create_user(new_user("sam@example.com")).unwrap();

    let err = service
        .modify_favorites(
            &Caller::new("sam@example.com", "sam-token"),
            FavoriteOp::Add,
            "NOPE",
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn favorites_require_matching_token() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = FavoritesService::new(SqliteUserRepository::new(&conn));
    service.create_user(new_user("sam@example.com")).unwrap();

    let intruder = Caller::new("sam@example.com", "guess");
    assert_eq!(
        service.list_favorites(&intruder).unwrap_err().kind(),
        ErrorKind::NotAuthorized
    );
    assert_eq!(
        service
            .modify_favorites(&intruder, FavoriteOp::Add, "PG-1")
            .unwrap_err()
            .kind(),
        ErrorKind::NotAuthorized
    );

    let stranger = Caller::new("nobody@example.com", "sam-token");
    assert_eq!(
        service.list_favorites(&stranger).unwrap_err().kind(),
        ErrorKind::NotAuthorized
    );
}
