//! User repository

use sqlx::SqlitePool;

use shared::models::{Role, User, UserCreate, UserUpdate};
use shared::util::now_millis;

use super::{RepoError, RepoResult};

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, password_hash, role, \
     shift, company_id, salary, is_active, travel_allowance_eligible, travel_allowance_amount, \
     cnic, father_name, contact_number, emergency_contact, whatsapp_number, blood_group, \
     current_address, permanent_address, profile_locked, created_at";

/// Create the bootstrap `admin` account if it does not exist yet.
pub async fn ensure_default_admin(pool: &SqlitePool, default_password: &str) -> RepoResult<()> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM user WHERE username = 'admin'")
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Ok(());
    }

    let hash = crate::auth::hash_password(default_password)
        .map_err(|e| RepoError::Database(e.to_string()))?;

    sqlx::query(
        "INSERT INTO user (first_name, last_name, username, email, password_hash, role, \
         salary, is_active, created_at) \
         VALUES ('System', 'Admin', 'admin', 'admin@localhost', ?, 'admin', 0, 1, ?)",
    )
    .bind(&hash)
    .bind(now_millis())
    .execute(pool)
    .await?;

    tracing::info!("Bootstrap admin account created");
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

/// Lookup by username, case-insensitive.
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user WHERE LOWER(username) = LOWER(?)"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn list_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user ORDER BY first_name, last_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Agents reporting to a supervisor's company.
pub async fn list_agents_by_company(pool: &SqlitePool, company_id: i64) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user \
         WHERE company_id = ? AND role = 'agent' ORDER BY first_name, last_name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Company roster for exports: supervisors first, then agents, each block
/// ordered by name.
pub async fn list_for_export(pool: &SqlitePool, company_id: i64) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user \
         WHERE company_id = ? AND role IN ('supervisor', 'agent') \
         ORDER BY CASE role WHEN 'supervisor' THEN 0 ELSE 1 END, first_name, last_name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn create(pool: &SqlitePool, req: &UserCreate, password_hash: &str) -> RepoResult<User> {
    if find_by_username(pool, &req.username).await?.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Username '{}' is already taken",
            req.username
        )));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO user (first_name, last_name, username, email, password_hash, role, shift, \
         company_id, salary, is_active, travel_allowance_eligible, travel_allowance_amount, \
         created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?) RETURNING id",
    )
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.username)
    .bind(&req.email)
    .bind(password_hash)
    .bind(req.role)
    .bind(req.shift)
    .bind(req.company_id)
    .bind(req.salary)
    .bind(req.travel_allowance_eligible)
    .bind(req.travel_allowance_amount)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id).await
}

/// Partial update; absent fields keep their current value.
pub async fn update(pool: &SqlitePool, id: i64, req: &UserUpdate) -> RepoResult<User> {
    sqlx::query(
        "UPDATE user SET \
         first_name = COALESCE(?, first_name), \
         last_name = COALESCE(?, last_name), \
         email = COALESCE(?, email), \
         role = COALESCE(?, role), \
         shift = COALESCE(?, shift), \
         company_id = COALESCE(?, company_id), \
         salary = COALESCE(?, salary), \
         travel_allowance_eligible = COALESCE(?, travel_allowance_eligible), \
         travel_allowance_amount = COALESCE(?, travel_allowance_amount) \
         WHERE id = ?",
    )
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(&req.email)
    .bind(req.role)
    .bind(req.shift)
    .bind(req.company_id)
    .bind(req.salary)
    .bind(req.travel_allowance_eligible)
    .bind(req.travel_allowance_amount)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

pub async fn set_active(pool: &SqlitePool, id: i64, is_active: bool) -> RepoResult<User> {
    let result = sqlx::query("UPDATE user SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id).await
}

pub async fn set_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<()> {
    let result = sqlx::query("UPDATE user SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

/// Self-service profile save. Writes the personal fields and locks the
/// profile so further edits require an admin unlock.
#[allow(clippy::too_many_arguments)]
pub async fn save_profile(
    pool: &SqlitePool,
    id: i64,
    cnic: Option<&str>,
    father_name: Option<&str>,
    contact_number: Option<&str>,
    emergency_contact: Option<&str>,
    whatsapp_number: Option<&str>,
    blood_group: Option<&str>,
    current_address: Option<&str>,
    permanent_address: Option<&str>,
) -> RepoResult<User> {
    sqlx::query(
        "UPDATE user SET cnic = ?, father_name = ?, contact_number = ?, emergency_contact = ?, \
         whatsapp_number = ?, blood_group = ?, current_address = ?, permanent_address = ?, \
         profile_locked = 1 \
         WHERE id = ?",
    )
    .bind(cnic)
    .bind(father_name)
    .bind(contact_number)
    .bind(emergency_contact)
    .bind(whatsapp_number)
    .bind(blood_group)
    .bind(current_address)
    .bind(permanent_address)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

pub async fn unlock_profile(pool: &SqlitePool, id: i64) -> RepoResult<User> {
    let result = sqlx::query("UPDATE user SET profile_locked = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id).await
}

/// Recipients of a broadcast, resolved at send time.
pub async fn resolve_broadcast_audience(
    pool: &SqlitePool,
    target: shared::models::BroadcastTarget,
    company_id: Option<i64>,
    shift: Option<shared::models::Shift>,
) -> RepoResult<Vec<User>> {
    use shared::models::BroadcastTarget;

    let users = match target {
        BroadcastTarget::All => {
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM user"))
                .fetch_all(pool)
                .await?
        }
        BroadcastTarget::Company => {
            let company_id = company_id
                .ok_or_else(|| RepoError::Validation("company_id is required".to_string()))?;
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE role != 'admin' AND company_id = ?"
            ))
            .bind(company_id)
            .fetch_all(pool)
            .await?
        }
        BroadcastTarget::Supervisors => {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE role = 'supervisor'"
            ))
            .fetch_all(pool)
            .await?
        }
        BroadcastTarget::SupervisorsCompany => {
            let company_id = company_id
                .ok_or_else(|| RepoError::Validation("company_id is required".to_string()))?;
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE role = 'supervisor' AND company_id = ?"
            ))
            .bind(company_id)
            .fetch_all(pool)
            .await?
        }
        BroadcastTarget::Shift => {
            let company_id = company_id
                .ok_or_else(|| RepoError::Validation("company_id is required".to_string()))?;
            let shift =
                shift.ok_or_else(|| RepoError::Validation("shift is required".to_string()))?;
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM user WHERE company_id = ? AND shift = ?"
            ))
            .bind(company_id)
            .bind(shift)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(users)
}

/// Guard used by supervisor routes: the target must exist, be an agent and
/// belong to the supervisor's company.
pub async fn find_agent_in_company(
    pool: &SqlitePool,
    agent_id: i64,
    company_id: i64,
) -> RepoResult<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM user WHERE id = ? AND company_id = ? AND role = ?"
    ))
    .bind(agent_id)
    .bind(company_id)
    .bind(Role::Agent)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| {
        RepoError::NotFound("Agent not found or not in your company.".to_string())
    })
}
