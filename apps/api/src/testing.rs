//! Row seeding for the Postgres-backed tests. Those tests run against a fresh
//! database per test (`#[sqlx::test]`) and are ignored unless asked for:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::user::UserType;

pub async fn account(pool: &PgPool, user_type: UserType) -> AuthUser {
    let name = format!("{} {}", user_type.as_str(), &Uuid::new_v4().simple().to_string()[..8]);
    let email = format!("{}@example.com", Uuid::new_v4().simple());
    let user_id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, 'x') RETURNING id",
    )
    .bind(&name)
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO user_profiles (user_id, user_type) VALUES ($1, $2)")
        .bind(user_id)
        .bind(user_type)
        .execute(pool)
        .await
        .unwrap();
    AuthUser {
        user_id,
        user_type,
        name,
        email,
    }
}

/// An active posting owned by `owner`, with the given salary range.
pub async fn posting(
    pool: &PgPool,
    owner: &AuthUser,
    min_salary: Option<i64>,
    max_salary: Option<i64>,
) -> Uuid {
    let company_id: Uuid = sqlx::query_scalar(
        "INSERT INTO companies (user_id, name) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(owner.user_id)
    .bind(format!("{} Ltd", owner.name))
    .fetch_one(pool)
    .await
    .unwrap();
    let category_id: Uuid = sqlx::query_scalar(
        "INSERT INTO categories (name, slug) VALUES ('Engineering', $1) RETURNING id",
    )
    .bind(Uuid::new_v4().simple().to_string())
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query_scalar(
        "INSERT INTO jobs (company_id, user_id, title, description, category_id, \
         employment_type, experience_level, min_salary, max_salary) \
         VALUES ($1, $2, 'Backend Engineer', 'Build APIs', $3, 'full_time', 'mid', $4, $5) \
         RETURNING id",
    )
    .bind(company_id)
    .bind(owner.user_id)
    .bind(category_id)
    .bind(min_salary)
    .bind(max_salary)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn count(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}
