mod common;

use common::{seed, PARK_LAT, PARK_LON, PARK_RADIUS_M};
use rusqlite::Connection;
use sitefinder_core::db::open_db_in_memory;
use sitefinder_core::{
    Caller, ErrorKind, InMemoryCredentialStore, NewReport, NewReview, NewUser, ReportKind,
    SiteQuery, SiteQueryService, SqliteSiteRepository, SqliteSubmissionRepository,
    SqliteUserRepository, SubmissionService, UserRepository,
};

const EMAIL: &str = "jo@example.com";
const TOKEN: &str = "token-jo";

fn create_user(conn: &Connection) {
    SqliteUserRepository::new(conn)
        .create_user(&NewUser {
            email: EMAIL.to_string(),
            first_name: "Jo".to_string(),
            last_name: "Park".to_string(),
            access_token: TOKEN.to_string(),
        })
        .unwrap();
}

fn service(
    conn: &Connection,
) -> SubmissionService<SqliteUserRepository<'_>, SqliteSiteRepository<'_>, SqliteSubmissionRepository<'_>>
{
    SubmissionService::new(
        SqliteUserRepository::new(conn),
        SqliteSiteRepository::new(conn),
        SqliteSubmissionRepository::new(conn),
    )
}

fn report_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM reports;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn equipment_issue_is_stored_with_canonical_equipment_name() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    create_user(&conn);

    let record = service(&conn)
        .submit_report(
            &Caller::new("JO@example.com", TOKEN),
            NewReport {
                site_id: "PG-1".to_string(),
                kind: ReportKind::EquipmentIssue {
                    equipment: " Slides ".to_string(),
                },
                comment: Some("  cracked step  ".to_string()),
            },
        )
        .unwrap();

    assert_eq!(record.site_id(), "PG-1");
    assert_eq!(record.reports.len(), 1);
    let report = &record.reports[0];
    assert_eq!(report.user_email, EMAIL);
    assert_eq!(report.kind.equipment(), Some("slides"));
    assert_eq!(report.comment.as_deref(), Some("cracked step"));
}

#[test]
fn submitted_rows_are_eager_loaded_by_queries() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    create_user(&conn);
    let caller = Caller::new(EMAIL, TOKEN);
    let submissions = service(&conn);

    submissions
        .submit_report(
            &caller,
            NewReport {
                site_id: "PG-2".to_string(),
                kind: ReportKind::Litter,
                comment: None,
            },
        )
        .unwrap();
    submissions
        .submit_review(
            &caller,
            NewReview {
                site_id: "PG-2".to_string(),
                stars: 4,
                comment: Some("shady".to_string()),
            },
        )
        .unwrap();

    let records = SiteQueryService::new(SqliteSiteRepository::new(&conn))
        .query(&SiteQuery::new(PARK_LAT, PARK_LON, PARK_RADIUS_M))
        .unwrap();
    let pg2 = records.iter().find(|r| r.site_id() == "PG-2").unwrap();
    assert_eq!(pg2.reports.len(), 1);
    assert_eq!(pg2.reports[0].kind, ReportKind::Litter);
    assert_eq!(pg2.reviews.len(), 1);
    assert_eq!(pg2.reviews[0].stars, 4);
    assert!(records
        .iter()
        .filter(|r| r.site_id() != "PG-2")
        .all(|r| r.reports.is_empty() && r.reviews.is_empty()));
}

#[test]
fn wrong_token_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    create_user(&conn);

    let err = service(&conn)
        .submit_report(
            &Caller::new(EMAIL, "stolen"),
            NewReport {
                site_id: "PG-1".to_string(),
                kind: ReportKind::Hazard,
                comment: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    assert_eq!(report_count(&conn), 0);
}

#[test]
fn unknown_equipment_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    create_user(&conn);

    let err = service(&conn)
        .submit_report(
            &Caller::new(EMAIL, TOKEN),
            NewReport {
                site_id: "PG-1".to_string(),
                kind: ReportKind::EquipmentIssue {
                    equipment: "zipline".to_string(),
                },
                comment: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownAttributeName);
    assert_eq!(report_count(&conn), 0);
}

#[test]
fn unknown_site_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    create_user(&conn);

    let err = service(&conn)
        .submit_review(
            &Caller::new(EMAIL, TOKEN),
            NewReview {
                site_id: "PG-404".to_string(),
                stars: 3,
                comment: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn stars_outside_range_are_invalid() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    create_user(&conn);

    for stars in [0, 6] {
        let err = service(&conn)
            .submit_review(
                &Caller::new(EMAIL, TOKEN),
                NewReview {
                    site_id: "PG-1".to_string(),
                    stars,
                    comment: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubmission);
    }
}

#[test]
fn injected_in_memory_credentials_authorize_submissions() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let mut credentials = InMemoryCredentialStore::new();
    credentials.insert("ops@example.com", "ops-token");

    let submissions = SubmissionService::new(
        credentials,
        SqliteSiteRepository::new(&conn),
        SqliteSubmissionRepository::new(&conn),
    );
    let record = submissions
        .submit_report(
            &Caller::new("ops@example.com", "ops-token"),
            NewReport {
                site_id: "PG-3".to_string(),
                kind: ReportKind::Vandalism,
                comment: None,
            },
        )
        .unwrap();
    assert_eq!(record.reports[0].user_email, "ops@example.com");
}
