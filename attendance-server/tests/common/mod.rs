//! Shared test fixtures: in-memory database plus roster seeding.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use shared::models::{Role, Shift};

/// Fresh in-memory database with migrations applied.
///
/// A single connection keeps the in-memory database alive for the whole
/// pool lifetime.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory options")
        .pragma("foreign_keys", "ON");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

pub async fn seed_company(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO company (name, created_at) VALUES (?, 0) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("insert company")
}

pub async fn seed_user(
    pool: &SqlitePool,
    username: &str,
    role: Role,
    company_id: Option<i64>,
    shift: Option<Shift>,
    salary: f64,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO user (first_name, last_name, username, email, password_hash, role, shift, \
         company_id, salary, is_active, created_at) \
         VALUES (?, 'Test', ?, ?, 'x', ?, ?, ?, ?, 1, 0) RETURNING id",
    )
    .bind(username)
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(role)
    .bind(shift)
    .bind(company_id)
    .bind(salary)
    .fetch_one(pool)
    .await
    .expect("insert user")
}
