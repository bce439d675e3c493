//! Broadcast repository

use sqlx::SqlitePool;

use shared::models::{Broadcast, BroadcastTarget, Role, SeenReceipt, Shift};
use shared::util::now_millis;

use super::{RepoError, RepoResult};

const BROADCAST_COLUMNS: &str =
    "id, sender_id, company_id, target, shift, title, message, created_at";

/// Window after creation during which an admin may still delete a broadcast.
pub const DELETE_WINDOW_MILLIS: i64 = 10 * 60 * 1000;

pub async fn create(
    pool: &SqlitePool,
    sender_id: i64,
    company_id: Option<i64>,
    target: BroadcastTarget,
    shift: Option<Shift>,
    title: Option<&str>,
    message: &str,
) -> RepoResult<Broadcast> {
    let broadcast = sqlx::query_as::<_, Broadcast>(&format!(
        "INSERT INTO broadcast (sender_id, company_id, target, shift, title, message, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {BROADCAST_COLUMNS}"
    ))
    .bind(sender_id)
    .bind(company_id)
    .bind(target)
    .bind(shift)
    .bind(title)
    .bind(message)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(broadcast)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Broadcast> {
    sqlx::query_as::<_, Broadcast>(&format!(
        "SELECT {BROADCAST_COLUMNS} FROM broadcast WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Broadcast {id} not found")))
}

/// SQL fragment selecting broadcasts the viewer is in the audience of.
/// Placeholders, in order: role, company_id, role, company_id, company_id,
/// shift.
const ELIGIBILITY_FILTER: &str = "(target = 'all' \
     OR (target = 'supervisors' AND ? = 'supervisor') \
     OR (target = 'company' AND company_id = ?) \
     OR (target = 'supervisors_company' AND ? = 'supervisor' AND company_id = ?) \
     OR (target = 'shift' AND company_id = ? AND shift = ?))";

/// Broadcasts the viewer can see but has not yet marked seen, newest first.
pub async fn list_unread(
    pool: &SqlitePool,
    user_id: i64,
    role: Role,
    company_id: Option<i64>,
    shift: Option<Shift>,
) -> RepoResult<Vec<Broadcast>> {
    let broadcasts = sqlx::query_as::<_, Broadcast>(&format!(
        "SELECT {BROADCAST_COLUMNS} FROM broadcast \
         WHERE {ELIGIBILITY_FILTER} \
         AND id NOT IN (SELECT broadcast_id FROM broadcast_seen WHERE user_id = ?) \
         ORDER BY created_at DESC"
    ))
    .bind(role)
    .bind(company_id)
    .bind(role)
    .bind(company_id)
    .bind(company_id)
    .bind(shift)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(broadcasts)
}

/// Everything the viewer is eligible for, read or not, newest first.
pub async fn list_eligible(
    pool: &SqlitePool,
    role: Role,
    company_id: Option<i64>,
    shift: Option<Shift>,
) -> RepoResult<Vec<Broadcast>> {
    let broadcasts = sqlx::query_as::<_, Broadcast>(&format!(
        "SELECT {BROADCAST_COLUMNS} FROM broadcast \
         WHERE {ELIGIBILITY_FILTER} ORDER BY created_at DESC"
    ))
    .bind(role)
    .bind(company_id)
    .bind(role)
    .bind(company_id)
    .bind(company_id)
    .bind(shift)
    .fetch_all(pool)
    .await?;
    Ok(broadcasts)
}

pub async fn list_all(pool: &SqlitePool) -> RepoResult<Vec<Broadcast>> {
    let broadcasts = sqlx::query_as::<_, Broadcast>(&format!(
        "SELECT {BROADCAST_COLUMNS} FROM broadcast ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(broadcasts)
}

/// Supervisor view: own company's broadcasts plus anything they sent.
pub async fn list_for_supervisor(
    pool: &SqlitePool,
    sender_id: i64,
    company_id: i64,
) -> RepoResult<Vec<Broadcast>> {
    let broadcasts = sqlx::query_as::<_, Broadcast>(&format!(
        "SELECT {BROADCAST_COLUMNS} FROM broadcast \
         WHERE sender_id = ? OR company_id = ? ORDER BY created_at DESC"
    ))
    .bind(sender_id)
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(broadcasts)
}

/// Record a read receipt. Marking twice updates `seen_at` in place; the
/// unique index keeps it one row per (broadcast, user).
pub async fn mark_seen(pool: &SqlitePool, broadcast_id: i64, user_id: i64) -> RepoResult<i64> {
    // The broadcast must still exist.
    find_by_id(pool, broadcast_id).await?;

    let seen_at: i64 = sqlx::query_scalar(
        "INSERT INTO broadcast_seen (broadcast_id, user_id, seen_at) VALUES (?, ?, ?) \
         ON CONFLICT (broadcast_id, user_id) DO UPDATE SET seen_at = excluded.seen_at \
         RETURNING seen_at",
    )
    .bind(broadcast_id)
    .bind(user_id)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(seen_at)
}

/// Delete a broadcast within the 10-minute window. Receipts go with it via
/// the FK cascade.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<Broadcast> {
    let broadcast = find_by_id(pool, id).await?;

    let age = now_millis() - broadcast.created_at;
    if age > DELETE_WINDOW_MILLIS {
        return Err(RepoError::Validation(
            "Broadcasts can only be deleted within 10 minutes of sending".to_string(),
        ));
    }

    sqlx::query("DELETE FROM broadcast WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(broadcast)
}

/// Per-broadcast read receipts with recipient detail, newest first.
pub async fn receipts(pool: &SqlitePool, broadcast_id: i64) -> RepoResult<Vec<SeenReceipt>> {
    let receipts = sqlx::query_as::<_, SeenReceipt>(
        "SELECT u.id AS user_id, u.username, u.first_name || ' ' || u.last_name AS full_name, \
         c.name AS company_name, s.seen_at \
         FROM broadcast_seen s \
         JOIN user u ON u.id = s.user_id \
         LEFT JOIN company c ON c.id = u.company_id \
         WHERE s.broadcast_id = ? ORDER BY s.seen_at DESC",
    )
    .bind(broadcast_id)
    .fetch_all(pool)
    .await?;
    Ok(receipts)
}
