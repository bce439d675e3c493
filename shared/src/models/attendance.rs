//! Attendance Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily attendance status. Stored verbatim as TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Off,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Off => "Off",
        }
    }

    /// Export cell priority when duplicate marks exist for one day
    /// (lower sorts first): Present > Late > Off > Absent.
    pub fn export_priority(&self) -> u8 {
        match self {
            AttendanceStatus::Present => 0,
            AttendanceStatus::Late => 1,
            AttendanceStatus::Off => 2,
            AttendanceStatus::Absent => 3,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attendance row: at most one per (user_id, date), enforced by a
/// unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Attendance {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Tracked independently of `status`; authoritative for lateness counts.
    pub is_late: bool,
    pub bonus: f64,
    pub penalty: f64,
    pub marked_by: Option<i64>,
    /// Unix millis (UTC) of the (last) marking.
    pub marked_at: i64,
}

/// Mark attendance payload (supervisor/admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub user_id: i64,
    /// Defaults to today in the business timezone when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub penalty: f64,
}
