//! Adjustment Ledger Models
//!
//! Penalties (negative), clearances (positive) and salary increments.
//! Penalties and clearances are append-only; increments can be revoked,
//! which restores the snapshotted previous salary.

use serde::{Deserialize, Serialize};

/// A deduction applied to a user for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Penalty {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub reason: String,
    pub marked_by: i64,
    pub created_at: i64,
}

/// Create penalty payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyCreate {
    pub user_id: i64,
    pub amount: f64,
    pub reason: String,
}

/// A positive salary adjustment (reimbursement/correction) — semantically
/// the inverse of a penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Clearance {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub reason: String,
    pub marked_by: i64,
    pub created_at: i64,
}

/// Create clearance payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearanceCreate {
    pub user_id: i64,
    pub amount: f64,
    pub reason: String,
}

/// A permanent base-salary change with the previous value snapshotted so
/// the change can be reversed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Increment {
    pub id: i64,
    pub user_id: i64,
    pub previous_salary: f64,
    pub increment_amount: f64,
    pub new_salary: f64,
    pub reason: String,
    pub created_at: i64,
}

/// Apply increment payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementApply {
    pub user_id: i64,
    pub amount: f64,
    pub reason: String,
}
