#![allow(dead_code)]

use salon_booking::{
    db,
    models::User,
    repo::users,
    validation::{validate_user, UserInput},
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Single-connection in-memory store with the schema applied.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::run_migrations(&pool).await.expect("migrations apply");
    pool
}

pub async fn customer(pool: &SqlitePool, email: &str) -> User {
    add_user(pool, email, "Casey", "Customer", None).await
}

pub async fn hairdresser(pool: &SqlitePool, email: &str) -> User {
    add_user(pool, email, "Harper", "Stylist", Some("hairdresser")).await
}

pub async fn add_user(
    pool: &SqlitePool,
    email: &str,
    first_name: &str,
    last_name: &str,
    level: Option<&str>,
) -> User {
    let input = UserInput {
        email,
        password: "password1",
        first_name,
        last_name,
        level,
        ..Default::default()
    };
    users::create(pool, validate_user(&input).expect("valid user"))
        .await
        .expect("user stored")
}
