//! Seeding helpers for tests that run against a real database.
//!
//! The spawned server inherits `DATABASE_URL`, so rows seeded here are what
//! it serves. Every helper tags its rows with a fresh suffix, which lets test
//! binaries share one database without seeing each other's data.
#![allow(dead_code)]

use anyhow::{ensure, Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use cdmis_api::auth::password::hash_password;
use cdmis_api::config::AppConfig;
use cdmis_api::database::DatabaseManager;
use cdmis_api::types::UserRole;

use super::TestServer;

pub const SEED_PASSWORD: &str = "correct-horse-battery";

/// A migrated pool, or `None` when no database is configured.
pub async fn pool() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return Ok(None);
    };

    let mut config = AppConfig::for_tests().database;
    config.url = url;
    let pool = DatabaseManager::connect(&config).await.context("connect to DATABASE_URL")?;
    DatabaseManager::migrate(&pool).await.context("apply migrations")?;
    Ok(Some(pool))
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn seed_department(pool: &PgPool) -> Result<(i64, String)> {
    let name = unique("Office");
    let id: i64 = sqlx::query_scalar("INSERT INTO departments (name) VALUES ($1) RETURNING id")
        .bind(&name)
        .fetch_one(pool)
        .await?;
    Ok((id, name))
}

#[derive(Debug, Clone)]
pub struct SeededUser {
    pub id: i64,
    pub school_id: String,
    pub role: UserRole,
    pub department_id: Option<i64>,
}

pub async fn seed_user(pool: &PgPool, role: UserRole, department_id: Option<i64>) -> Result<SeededUser> {
    let school_id = unique("SID");
    let hash = hash_password(SEED_PASSWORD, 4).await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (school_id, password_hash, full_name, email, role, department_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(&school_id)
    .bind(&hash)
    .bind("Seeded Account")
    .bind(format!("{}@example.edu", school_id.to_lowercase()))
    .bind(role.as_str())
    .bind(department_id)
    .fetch_one(pool)
    .await?;

    Ok(SeededUser {
        id,
        school_id,
        role,
        department_id,
    })
}

pub async fn seed_record(
    pool: &PgPool,
    department_id: i64,
    creator: &SeededUser,
    title: &str,
    medium: &str,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO records (record_series_title_description, record_medium, department_id, created_by_user_id)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(title)
    .bind(medium)
    .bind(department_id)
    .bind(creator.id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Log in through the API and return the access token.
pub async fn login(server: &TestServer, client: &Client, user: &SeededUser) -> Result<String> {
    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "school_id": user.school_id, "password": SEED_PASSWORD }))
        .send()
        .await?;
    ensure!(res.status() == StatusCode::OK, "login for {} failed with {}", user.school_id, res.status());

    let body = res.json::<Value>().await?;
    body["token"].as_str().map(str::to_string).context("login returned no token")
}
