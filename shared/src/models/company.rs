//! Company Model

use serde::{Deserialize, Serialize};

/// A company owning a partition of users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Company {
    pub id: i64,
    pub name: String,
    /// Admin user who created the company.
    pub created_by: Option<i64>,
    /// Unix millis (UTC).
    pub created_at: i64,
}

/// Company listing entry with its user count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CompanyWithCount {
    pub id: i64,
    pub name: String,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub user_count: i64,
}

/// Create company payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyCreate {
    pub name: String,
}

/// Delete company payload — requires the admin to re-enter their password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDelete {
    pub password: String,
}
