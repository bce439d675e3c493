//! Company repository

use sqlx::SqlitePool;

use shared::models::{Company, CompanyWithCount};
use shared::util::now_millis;

use super::{RepoError, RepoResult};

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Company> {
    sqlx::query_as::<_, Company>(
        "SELECT id, name, created_by, created_at FROM company WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Company {id} not found")))
}

/// All companies with their current headcount.
pub async fn list_with_counts(pool: &SqlitePool) -> RepoResult<Vec<CompanyWithCount>> {
    let companies = sqlx::query_as::<_, CompanyWithCount>(
        "SELECT c.id, c.name, c.created_by, c.created_at, \
         (SELECT COUNT(*) FROM user u WHERE u.company_id = c.id) AS user_count \
         FROM company c ORDER BY c.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(companies)
}

pub async fn create(pool: &SqlitePool, name: &str, created_by: i64) -> RepoResult<Company> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM company WHERE LOWER(name) = LOWER(?)")
            .bind(name)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Err(RepoError::Duplicate(format!(
            "Company '{name}' already exists"
        )));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO company (name, created_by, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(created_by)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id).await
}

/// Delete a company. Refused while any user still belongs to it.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE company_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    if user_count > 0 {
        return Err(RepoError::Validation(format!(
            "Company has {user_count} assigned users; reassign them first"
        )));
    }

    let result = sqlx::query("DELETE FROM company WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Company {id} not found")));
    }
    Ok(())
}
