//! User Model

use serde::{Deserialize, Serialize};

use super::{Role, Shift};

/// A user record.
///
/// `password_hash` is never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub shift: Option<Shift>,
    /// Null only for admins.
    pub company_id: Option<i64>,
    pub salary: f64,
    pub is_active: bool,
    pub travel_allowance_eligible: bool,
    pub travel_allowance_amount: f64,
    pub cnic: Option<String>,
    pub father_name: Option<String>,
    pub contact_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub whatsapp_number: Option<String>,
    pub blood_group: Option<String>,
    pub current_address: Option<String>,
    pub permanent_address: Option<String>,
    /// Set after the first self-service profile save; only an admin clears it.
    pub profile_locked: bool,
    /// Unix millis (UTC).
    pub created_at: i64,
}

impl User {
    /// Effective active flag.
    ///
    /// The bootstrap "admin" account is always treated as active regardless
    /// of the stored flag, so a misconfigured toggle can never lock out the
    /// last administrator.
    pub fn is_effectively_active(&self) -> bool {
        self.username == "admin" || self.is_active
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Create user payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    /// Falls back to the configured default password when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<Shift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub travel_allowance_eligible: bool,
    #[serde(default)]
    pub travel_allowance_amount: f64,
}

/// Update user payload (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub shift: Option<Shift>,
    pub company_id: Option<i64>,
    pub salary: Option<f64>,
    pub travel_allowance_eligible: Option<bool>,
    pub travel_allowance_amount: Option<f64>,
}

/// Compact user info returned on login / `me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub company_id: Option<i64>,
    pub shift: Option<Shift>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            role: user.role,
            company_id: user.company_id,
            shift: user.shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(username: &str, is_active: bool) -> User {
        User {
            id: 1,
            first_name: "Test".into(),
            last_name: "User".into(),
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: String::new(),
            role: Role::Admin,
            shift: None,
            company_id: None,
            salary: 0.0,
            is_active,
            travel_allowance_eligible: false,
            travel_allowance_amount: 0.0,
            cnic: None,
            father_name: None,
            contact_number: None,
            emergency_contact: None,
            whatsapp_number: None,
            blood_group: None,
            current_address: None,
            permanent_address: None,
            profile_locked: false,
            created_at: 0,
        }
    }

    #[test]
    fn admin_username_is_always_active() {
        assert!(make_user("admin", false).is_effectively_active());
        assert!(make_user("admin", true).is_effectively_active());
    }

    #[test]
    fn other_users_follow_stored_flag() {
        assert!(!make_user("ali", false).is_effectively_active());
        assert!(make_user("ali", true).is_effectively_active());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let mut user = make_user("ali", true);
        user.password_hash = "secret".into();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }
}
