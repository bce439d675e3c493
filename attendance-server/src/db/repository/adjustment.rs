//! Adjustment ledger: penalties, clearances and salary increments.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use shared::models::{Clearance, Increment, Penalty};
use shared::util::now_millis;

use super::{RepoError, RepoResult};

pub async fn add_penalty(
    pool: &SqlitePool,
    user_id: i64,
    amount: f64,
    reason: &str,
    marked_by: i64,
) -> RepoResult<Penalty> {
    let penalty = sqlx::query_as::<_, Penalty>(
        "INSERT INTO penalty (user_id, amount, reason, marked_by, created_at) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING id, user_id, amount, reason, marked_by, created_at",
    )
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(marked_by)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(penalty)
}

pub async fn add_clearance(
    pool: &SqlitePool,
    user_id: i64,
    amount: f64,
    reason: &str,
    marked_by: i64,
) -> RepoResult<Clearance> {
    let clearance = sqlx::query_as::<_, Clearance>(
        "INSERT INTO clearance (user_id, amount, reason, marked_by, created_at) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING id, user_id, amount, reason, marked_by, created_at",
    )
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(marked_by)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    Ok(clearance)
}

pub async fn list_penalties(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Penalty>> {
    let penalties = sqlx::query_as::<_, Penalty>(
        "SELECT id, user_id, amount, reason, marked_by, created_at \
         FROM penalty WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(penalties)
}

pub async fn list_clearances(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Clearance>> {
    let clearances = sqlx::query_as::<_, Clearance>(
        "SELECT id, user_id, amount, reason, marked_by, created_at \
         FROM clearance WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(clearances)
}

/// Ledger sums over a payroll period (timestamps are unix millis, half-open
/// `[start, end)`).
pub async fn sum_penalties_in_window(
    pool: &SqlitePool,
    user_id: i64,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<f64> {
    let sum: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0.0) FROM penalty \
         WHERE user_id = ? AND created_at >= ? AND created_at < ?",
    )
    .bind(user_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}

pub async fn sum_clearances_in_window(
    pool: &SqlitePool,
    user_id: i64,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<f64> {
    let sum: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0.0) FROM clearance \
         WHERE user_id = ? AND created_at >= ? AND created_at < ?",
    )
    .bind(user_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}

/// Apply a salary increment: records the ledger entry and moves the user's
/// salary in the same transaction.
pub async fn apply_increment(
    pool: &SqlitePool,
    user_id: i64,
    amount: f64,
    reason: &str,
) -> RepoResult<Increment> {
    if amount <= 0.0 {
        return Err(RepoError::Validation(
            "Increment amount must be positive".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let previous_salary: f64 = sqlx::query_scalar("SELECT salary FROM user WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {user_id} not found")))?;

    let new_salary = previous_salary + amount;

    sqlx::query("UPDATE user SET salary = ? WHERE id = ?")
        .bind(new_salary)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let increment = sqlx::query_as::<_, Increment>(
        "INSERT INTO increment (user_id, previous_salary, increment_amount, new_salary, reason, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING id, user_id, previous_salary, increment_amount, new_salary, reason, created_at",
    )
    .bind(user_id)
    .bind(previous_salary)
    .bind(amount)
    .bind(new_salary)
    .bind(reason)
    .bind(now_millis())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(increment)
}

/// Revoke an increment: restores the recorded previous salary and removes the
/// ledger entry, atomically.
pub async fn revoke_increment(pool: &SqlitePool, increment_id: i64) -> RepoResult<Increment> {
    let mut tx = pool.begin().await?;

    let increment = sqlx::query_as::<_, Increment>(
        "SELECT id, user_id, previous_salary, increment_amount, new_salary, reason, created_at \
         FROM increment WHERE id = ?",
    )
    .bind(increment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Increment {increment_id} not found")))?;

    sqlx::query("UPDATE user SET salary = ? WHERE id = ?")
        .bind(increment.previous_salary)
        .bind(increment.user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM increment WHERE id = ?")
        .bind(increment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(increment)
}

pub async fn list_increments(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Increment>> {
    let increments = sqlx::query_as::<_, Increment>(
        "SELECT id, user_id, previous_salary, increment_amount, new_salary, reason, created_at \
         FROM increment WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(increments)
}

/// Month window as unix-millis bounds, for ledger sums aligned to an
/// attendance month.
pub fn month_window_millis(start: NaiveDate, end_exclusive: NaiveDate) -> (i64, i64) {
    let start_ms = start
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0);
    let end_ms = end_exclusive
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(i64::MAX);
    (start_ms, end_ms)
}
