//! Broadcast fan-out, read receipts and the deletion window.

mod common;

use attendance_server::db::repository::{broadcast, user as user_repo, RepoError};
use shared::models::{BroadcastTarget, Role, Shift};
use shared::util::now_millis;

use common::{seed_company, seed_user, test_pool};

#[tokio::test]
async fn company_audience_matches_exactly_that_company() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let eagle = seed_company(&pool, "Eagle").await;

    seed_user(&pool, "admin1", Role::Admin, None, None, 0.0).await;
    let f_sup = seed_user(&pool, "fsup", Role::Supervisor, Some(falcon), None, 0.0).await;
    let f_agent = seed_user(&pool, "fagent", Role::Agent, Some(falcon), None, 0.0).await;
    seed_user(&pool, "eagent", Role::Agent, Some(eagle), None, 0.0).await;

    let audience =
        user_repo::resolve_broadcast_audience(&pool, BroadcastTarget::Company, Some(falcon), None)
            .await
            .unwrap();

    let mut ids: Vec<i64> = audience.iter().map(|u| u.id).collect();
    ids.sort();
    assert_eq!(ids, vec![f_sup, f_agent]);
}

#[tokio::test]
async fn supervisors_audience_ignores_company() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let eagle = seed_company(&pool, "Eagle").await;

    let f_sup = seed_user(&pool, "fsup", Role::Supervisor, Some(falcon), None, 0.0).await;
    let e_sup = seed_user(&pool, "esup", Role::Supervisor, Some(eagle), None, 0.0).await;
    seed_user(&pool, "fagent", Role::Agent, Some(falcon), None, 0.0).await;

    let audience =
        user_repo::resolve_broadcast_audience(&pool, BroadcastTarget::Supervisors, None, None)
            .await
            .unwrap();
    let mut ids: Vec<i64> = audience.iter().map(|u| u.id).collect();
    ids.sort();
    assert_eq!(ids, vec![f_sup, e_sup]);
}

#[tokio::test]
async fn all_audience_includes_every_user() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;

    let boss = seed_user(&pool, "boss", Role::Admin, None, None, 0.0).await;
    let boss2 = seed_user(&pool, "boss2", Role::Admin, None, None, 0.0).await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(falcon), None, 0.0).await;

    let audience = user_repo::resolve_broadcast_audience(&pool, BroadcastTarget::All, None, None)
        .await
        .unwrap();
    let mut ids: Vec<i64> = audience.iter().map(|u| u.id).collect();
    ids.sort();
    assert_eq!(ids, vec![boss, boss2, agent]);
}

#[tokio::test]
async fn shift_push_audience_stays_inside_the_company() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let eagle = seed_company(&pool, "Eagle").await;

    let f_night = seed_user(
        &pool,
        "fnight",
        Role::Agent,
        Some(falcon),
        Some(Shift::Night),
        0.0,
    )
    .await;
    seed_user(
        &pool,
        "enight",
        Role::Agent,
        Some(eagle),
        Some(Shift::Night),
        0.0,
    )
    .await;

    let audience = user_repo::resolve_broadcast_audience(
        &pool,
        BroadcastTarget::Shift,
        Some(falcon),
        Some(Shift::Night),
    )
    .await
    .unwrap();
    let ids: Vec<i64> = audience.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![f_night]);

    // A shift push without a company is a caller bug, not a wider audience.
    let err = user_repo::resolve_broadcast_audience(
        &pool,
        BroadcastTarget::Shift,
        None,
        Some(Shift::Night),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn shift_audience_requires_matching_company_and_shift() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;

    let night = seed_user(
        &pool,
        "night",
        Role::Agent,
        Some(falcon),
        Some(Shift::Night),
        0.0,
    )
    .await;
    let morning = seed_user(
        &pool,
        "morning",
        Role::Agent,
        Some(falcon),
        Some(Shift::Morning),
        0.0,
    )
    .await;

    let sup = seed_user(&pool, "sup", Role::Supervisor, Some(falcon), Some(Shift::Night), 0.0).await;
    let sent = broadcast::create(
        &pool,
        sup,
        Some(falcon),
        BroadcastTarget::Shift,
        Some(Shift::Night),
        None,
        "Night shift meeting",
    )
    .await
    .unwrap();

    // The night agent sees it unread; the morning agent does not.
    let unread = broadcast::list_unread(&pool, night, Role::Agent, Some(falcon), Some(Shift::Night))
        .await
        .unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, sent.id);

    let unread = broadcast::list_unread(
        &pool,
        morning,
        Role::Agent,
        Some(falcon),
        Some(Shift::Morning),
    )
    .await
    .unwrap();
    assert!(unread.is_empty());
}

#[tokio::test]
async fn mark_seen_is_idempotent_and_updates_seen_at() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let admin = seed_user(&pool, "boss", Role::Admin, None, None, 0.0).await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(falcon), None, 0.0).await;

    let sent = broadcast::create(&pool, admin, None, BroadcastTarget::All, None, None, "Hello")
        .await
        .unwrap();

    let first = broadcast::mark_seen(&pool, sent.id, agent).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = broadcast::mark_seen(&pool, sent.id, agent).await.unwrap();

    assert!(second >= first);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM broadcast_seen WHERE broadcast_id = ? AND user_id = ?",
    )
    .bind(sent.id)
    .bind(agent)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);

    // Seen broadcasts drop out of the unread list.
    let unread = broadcast::list_unread(&pool, agent, Role::Agent, Some(falcon), None)
        .await
        .unwrap();
    assert!(unread.is_empty());
}

#[tokio::test]
async fn delete_window_allows_nine_minutes_refuses_eleven() {
    let pool = test_pool().await;
    let admin = seed_user(&pool, "boss", Role::Admin, None, None, 0.0).await;

    let recent = broadcast::create(&pool, admin, None, BroadcastTarget::All, None, None, "A")
        .await
        .unwrap();
    let stale = broadcast::create(&pool, admin, None, BroadcastTarget::All, None, None, "B")
        .await
        .unwrap();

    // Age the records directly: 9 and 11 minutes.
    let now = now_millis();
    sqlx::query("UPDATE broadcast SET created_at = ? WHERE id = ?")
        .bind(now - 9 * 60 * 1000)
        .bind(recent.id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE broadcast SET created_at = ? WHERE id = ?")
        .bind(now - 11 * 60 * 1000)
        .bind(stale.id)
        .execute(&pool)
        .await
        .unwrap();

    broadcast::delete(&pool, recent.id).await.unwrap();

    let err = broadcast::delete(&pool, stale.id).await.unwrap_err();
    match err {
        RepoError::Validation(msg) => assert!(msg.contains("10 minutes")),
        other => panic!("expected Validation, got {other:?}"),
    }

    // The stale one survived.
    assert!(broadcast::find_by_id(&pool, stale.id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_broadcast_cascades_to_receipts() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let admin = seed_user(&pool, "boss", Role::Admin, None, None, 0.0).await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(falcon), None, 0.0).await;

    let sent = broadcast::create(&pool, admin, None, BroadcastTarget::All, None, None, "Hello")
        .await
        .unwrap();
    broadcast::mark_seen(&pool, sent.id, agent).await.unwrap();

    broadcast::delete(&pool, sent.id).await.unwrap();

    let receipts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM broadcast_seen")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(receipts, 0);
}

#[tokio::test]
async fn receipts_resolve_names_and_companies() {
    let pool = test_pool().await;
    let falcon = seed_company(&pool, "Falcon").await;
    let admin = seed_user(&pool, "boss", Role::Admin, None, None, 0.0).await;
    let agent = seed_user(&pool, "ali", Role::Agent, Some(falcon), None, 0.0).await;

    let sent = broadcast::create(&pool, admin, None, BroadcastTarget::All, None, None, "Hello")
        .await
        .unwrap();
    broadcast::mark_seen(&pool, sent.id, agent).await.unwrap();

    let receipts = broadcast::receipts(&pool, sent.id).await.unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].username, "ali");
    assert_eq!(receipts[0].full_name, "ali Test");
    assert_eq!(receipts[0].company_name.as_deref(), Some("Falcon"));
}
