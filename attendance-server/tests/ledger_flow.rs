//! Attendance and adjustment ledger integration tests.

mod common;

use chrono::NaiveDate;

use attendance_server::db::repository::{adjustment, attendance, user as user_repo, RepoError};
use shared::models::{AttendanceStatus, Role, Shift};

use common::{seed_company, seed_user, test_pool};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
}

#[tokio::test]
async fn marking_twice_keeps_a_single_row() {
    let pool = test_pool().await;
    let company = seed_company(&pool, "Falcon").await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(company), Some(Shift::Morning), 30000.0).await;
    let supervisor =
        seed_user(&pool, "sara", Role::Supervisor, Some(company), Some(Shift::Morning), 50000.0).await;

    let first = attendance::mark(
        &pool,
        agent,
        day(4),
        AttendanceStatus::Absent,
        0.0,
        0.0,
        Some(supervisor),
    )
    .await
    .unwrap();

    let second = attendance::mark(
        &pool,
        agent,
        day(4),
        AttendanceStatus::Present,
        100.0,
        0.0,
        Some(supervisor),
    )
    .await
    .unwrap();

    // Same row, updated in place.
    assert_eq!(first.id, second.id);
    assert_eq!(second.status, AttendanceStatus::Present);
    assert_eq!(second.bonus, 100.0);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE user_id = ? AND date = ?")
            .bind(agent)
            .bind(day(4))
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn late_mark_sets_the_late_flag() {
    let pool = test_pool().await;
    let company = seed_company(&pool, "Falcon").await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(company), None, 30000.0).await;

    let record = attendance::mark(&pool, agent, day(1), AttendanceStatus::Late, 0.0, 0.0, None)
        .await
        .unwrap();
    assert!(record.is_late);

    let record = attendance::mark(&pool, agent, day(1), AttendanceStatus::Present, 0.0, 0.0, None)
        .await
        .unwrap();
    assert!(!record.is_late);
}

#[tokio::test]
async fn range_summary_counts_statuses() {
    let pool = test_pool().await;
    let company = seed_company(&pool, "Falcon").await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(company), None, 30000.0).await;

    for (d, status) in [
        (1, AttendanceStatus::Present),
        (2, AttendanceStatus::Present),
        (3, AttendanceStatus::Late),
        (4, AttendanceStatus::Off),
        (5, AttendanceStatus::Absent),
    ] {
        attendance::mark(&pool, agent, day(d), status, 50.0, 10.0, None)
            .await
            .unwrap();
    }

    let (counts, bonus, penalty) = attendance::summarize_range(&pool, agent, day(1), day(31))
        .await
        .unwrap();
    assert_eq!(counts.present, 2);
    assert_eq!(counts.late, 1);
    assert_eq!(counts.off, 1);
    assert_eq!(counts.absent, 1);
    assert_eq!(counts.total_marked(), 5);
    assert_eq!(bonus, 250.0);
    assert_eq!(penalty, 50.0);
}

#[tokio::test]
async fn increment_apply_then_revoke_restores_salary() {
    let pool = test_pool().await;
    let company = seed_company(&pool, "Falcon").await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(company), None, 30000.0).await;

    let increment = adjustment::apply_increment(&pool, agent, 5000.0, "Annual raise")
        .await
        .unwrap();
    assert_eq!(increment.previous_salary, 30000.0);
    assert_eq!(increment.new_salary, 35000.0);

    let user = user_repo::find_by_id(&pool, agent).await.unwrap();
    assert_eq!(user.salary, 35000.0);

    let revoked = adjustment::revoke_increment(&pool, increment.id).await.unwrap();
    assert_eq!(revoked.id, increment.id);

    let user = user_repo::find_by_id(&pool, agent).await.unwrap();
    assert_eq!(user.salary, 30000.0);

    // The ledger row is gone with the salary restored.
    let remaining = adjustment::list_increments(&pool, agent).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn increment_requires_positive_amount_and_existing_user() {
    let pool = test_pool().await;

    let err = adjustment::apply_increment(&pool, 1, 0.0, "noop").await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = adjustment::apply_increment(&pool, 999, 100.0, "ghost").await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    let err = adjustment::revoke_increment(&pool, 999).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn penalty_and_clearance_sums_respect_the_window() {
    let pool = test_pool().await;
    let company = seed_company(&pool, "Falcon").await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(company), None, 30000.0).await;
    let admin = seed_user(&pool, "boss", Role::Admin, None, None, 0.0).await;

    adjustment::add_penalty(&pool, agent, 200.0, "Late report", admin)
        .await
        .unwrap();
    adjustment::add_clearance(&pool, agent, 150.0, "Advance cleared", admin)
        .await
        .unwrap();

    let now = shared::util::now_millis();
    let penalties = adjustment::sum_penalties_in_window(&pool, agent, now - 60_000, now + 60_000)
        .await
        .unwrap();
    let clearances =
        adjustment::sum_clearances_in_window(&pool, agent, now - 60_000, now + 60_000)
            .await
            .unwrap();
    assert_eq!(penalties, 200.0);
    assert_eq!(clearances, 150.0);

    // Outside the window nothing counts, and an empty window still sums.
    let outside = adjustment::sum_penalties_in_window(&pool, agent, 0, 1000)
        .await
        .unwrap();
    assert_eq!(outside, 0.0);
    let outside = adjustment::sum_clearances_in_window(&pool, agent, 0, 1000)
        .await
        .unwrap();
    assert_eq!(outside, 0.0);
}

#[tokio::test]
async fn supervisor_scope_guard_hides_other_companies() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let eagle = seed_company(&pool, "Eagle").await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(eagle), None, 30000.0).await;

    // A supervisor in Falcon must not see Eagle's agent, and the error must
    // read as not-found.
    let err = user_repo::find_agent_in_company(&pool, agent, falcon)
        .await
        .unwrap_err();
    match err {
        RepoError::NotFound(msg) => {
            assert_eq!(msg, "Agent not found or not in your company.");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn ensure_default_admin_is_idempotent() {
    let pool = test_pool().await;

    user_repo::ensure_default_admin(&pool, "Default@1234").await.unwrap();
    user_repo::ensure_default_admin(&pool, "Default@1234").await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE username = 'admin'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let admin = user_repo::find_by_username(&pool, "ADMIN").await.unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.is_effectively_active());
}
