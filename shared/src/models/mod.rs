//! Data models
//!
//! Shared between attendance-server and clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).
//!
//! Role, shift, attendance status and broadcast target are closed enums
//! stored as TEXT, so an unknown value is a decode error rather than a
//! silently-accepted string.

pub mod adjustment;
pub mod attendance;
pub mod broadcast;
pub mod company;
pub mod role;
pub mod shift;
pub mod user;

pub use adjustment::{
    Clearance, ClearanceCreate, Increment, IncrementApply, Penalty, PenaltyCreate,
};
pub use attendance::{Attendance, AttendanceMark, AttendanceStatus};
pub use broadcast::{
    Broadcast, BroadcastCreate, BroadcastSeen, BroadcastTarget, SeenReceipt,
};
pub use company::{Company, CompanyCreate, CompanyDelete, CompanyWithCount};
pub use role::Role;
pub use shift::Shift;
pub use user::{User, UserCreate, UserInfo, UserUpdate};
