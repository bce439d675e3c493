//! Attendance repository

use chrono::NaiveDate;
use sqlx::SqlitePool;

use shared::models::{Attendance, AttendanceStatus};
use shared::util::now_millis;

use super::RepoResult;

const ATTENDANCE_COLUMNS: &str =
    "id, user_id, date, status, is_late, bonus, penalty, marked_by, marked_at";

/// Counts per status over a date range, used as payroll input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    pub off: i64,
}

impl StatusCounts {
    pub fn total_marked(&self) -> i64 {
        self.present + self.late + self.absent + self.off
    }
}

/// Mark attendance for a user on a date. A second mark for the same
/// (user, date) replaces the first in place; the unique index guarantees a
/// single row even under concurrent marks.
#[allow(clippy::too_many_arguments)]
pub async fn mark(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
    bonus: f64,
    penalty: f64,
    marked_by: Option<i64>,
) -> RepoResult<Attendance> {
    let is_late = status == AttendanceStatus::Late;

    let attendance = sqlx::query_as::<_, Attendance>(&format!(
        "INSERT INTO attendance (user_id, date, status, is_late, bonus, penalty, marked_by, marked_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (user_id, date) DO UPDATE SET \
         status = excluded.status, is_late = excluded.is_late, bonus = excluded.bonus, \
         penalty = excluded.penalty, marked_by = excluded.marked_by, marked_at = excluded.marked_at \
         RETURNING {ATTENDANCE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(date)
    .bind(status)
    .bind(is_late)
    .bind(bonus)
    .bind(penalty)
    .bind(marked_by)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    Ok(attendance)
}

/// All records for one user within `[start, end]`, oldest first.
pub async fn list_for_user_range(
    pool: &SqlitePool,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> RepoResult<Vec<Attendance>> {
    let records = sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date"
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// All records for a whole company within `[start, end]`.
pub async fn list_for_company_range(
    pool: &SqlitePool,
    company_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> RepoResult<Vec<Attendance>> {
    let records = sqlx::query_as::<_, Attendance>(
        "SELECT a.id, a.user_id, a.date, a.status, a.is_late, a.bonus, a.penalty, \
         a.marked_by, a.marked_at \
         FROM attendance a \
         JOIN user u ON u.id = a.user_id \
         WHERE u.company_id = ? AND a.date >= ? AND a.date <= ? \
         ORDER BY a.user_id, a.date",
    )
    .bind(company_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Status counts plus bonus/penalty sums for one user over a range.
///
/// The `is_late` flag, not the status string, decides the late count; a
/// non-late row with a Late status still counts as attended.
pub async fn summarize_range(
    pool: &SqlitePool,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> RepoResult<(StatusCounts, f64, f64)> {
    let row: (i64, i64, i64, i64, f64, f64) = sqlx::query_as(
        "SELECT \
           COUNT(CASE WHEN is_late = 0 AND status IN ('Present', 'Late') THEN 1 END), \
           COUNT(CASE WHEN is_late = 1 THEN 1 END), \
           COUNT(CASE WHEN is_late = 0 AND status = 'Absent' THEN 1 END), \
           COUNT(CASE WHEN is_late = 0 AND status = 'Off' THEN 1 END), \
           COALESCE(SUM(bonus), 0.0), COALESCE(SUM(penalty), 0.0) \
         FROM attendance WHERE user_id = ? AND date >= ? AND date <= ?",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    let (present, late, absent, off, bonus_total, penalty_total) = row;
    let counts = StatusCounts {
        present,
        late,
        absent,
        off,
    };
    Ok((counts, bonus_total, penalty_total))
}
