//! Broadcast Models

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Shift;

/// Audience selector for a broadcast.
///
/// | target               | recipients                                          |
/// |----------------------|-----------------------------------------------------|
/// | all                  | every user                                          |
/// | company              | users with matching company_id                      |
/// | supervisors          | users with role=supervisor                          |
/// | supervisors_company  | supervisors with matching company_id                |
/// | shift                | users with matching company_id AND shift            |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum BroadcastTarget {
    All,
    Company,
    Supervisors,
    SupervisorsCompany,
    Shift,
}

impl BroadcastTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastTarget::All => "all",
            BroadcastTarget::Company => "company",
            BroadcastTarget::Supervisors => "supervisors",
            BroadcastTarget::SupervisorsCompany => "supervisors_company",
            BroadcastTarget::Shift => "shift",
        }
    }
}

impl fmt::Display for BroadcastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An announcement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Broadcast {
    pub id: i64,
    pub sender_id: i64,
    /// Null means organization-wide.
    pub company_id: Option<i64>,
    pub target: BroadcastTarget,
    /// Set only for target=shift.
    pub shift: Option<Shift>,
    pub title: Option<String>,
    pub message: String,
    /// Unix millis (UTC), server-assigned.
    pub created_at: i64,
}

/// Create broadcast payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastCreate {
    pub target: BroadcastTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
    /// Explicit recipient user ids (supervisor direct-to-agents send).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
}

/// Read receipt — unique per (broadcast_id, user_id), idempotent upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BroadcastSeen {
    pub id: i64,
    pub broadcast_id: i64,
    pub user_id: i64,
    pub seen_at: i64,
}

/// Receipt detail entry for the admin view (who saw it, where, when).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SeenReceipt {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub company_name: Option<String>,
    pub seen_at: i64,
}
