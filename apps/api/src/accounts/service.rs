//! Registration, login and the caller's own profile.

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::accounts::validation::{
    validate_profile, validate_profile_skills, LoginRequest, NewAccount, ProfileSkillsRequest,
    ProfileUpdateRequest,
};
use crate::activity::{self, Activity};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::{issue_token, revoke_token};
use crate::auth::AuthUser;
use crate::catalog::companies::company_for_user;
use crate::catalog::skills::{attached_skills, sync_skills};
use crate::config::Config;
use crate::errors::{AppError, FieldErrors};
use crate::models::catalog::{AttachedSkill, SkillableType};
use crate::models::company::{Company, CompanyStatus};
use crate::models::user::{User, UserProfile};

#[derive(Debug, Serialize)]
pub struct Account {
    pub user: User,
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    pub skills: Vec<AttachedSkill>,
}

#[derive(Debug, Serialize)]
pub struct Session {
    #[serde(flatten)]
    pub account: Account,
    pub token: String,
    pub token_type: &'static str,
}

impl Session {
    fn new(account: Account, token: String) -> Self {
        Self {
            account,
            token,
            token_type: "Bearer",
        }
    }
}

async fn load_account(pool: &PgPool, user: User) -> Result<Account, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(pool)
        .await?;
    let company = if profile.user_type.is_employer() {
        company_for_user(pool, user.id).await?
    } else {
        None
    };
    let skills = attached_skills(pool, SkillableType::User, user.id).await?;
    Ok(Account {
        user,
        profile,
        company,
        skills,
    })
}

pub async fn register(pool: &PgPool, config: &Config, new: NewAccount) -> Result<Session, AppError> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = $1)")
            .bind(&new.email)
            .fetch_one(pool)
            .await?;
    if taken {
        return Err(AppError::Validation(FieldErrors::single(
            "email",
            "The email has already been taken",
        )));
    }

    let password_hash = hash_password(&new.password)?;

    let mut tx = pool.begin().await?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.email)
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO user_profiles (user_id, user_type) VALUES ($1, $2)")
        .bind(user.id)
        .bind(new.user_type)
        .execute(&mut *tx)
        .await?;

    let mut company_id = None;
    if let Some(company_name) = new.company_name.as_deref() {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO companies (user_id, name, status, is_verified) \
             VALUES ($1, $2, $3, FALSE) RETURNING id",
        )
        .bind(user.id)
        .bind(company_name)
        .bind(CompanyStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;
        company_id = Some(id);
    }

    let token = issue_token(&mut *tx, user.id, config.token_ttl_hours).await?;

    activity::record(
        &mut *tx,
        Activity {
            user_id: Some(user.id),
            company_id,
            action: "account.registered",
            description: format!("{} registered as {}", user.name, new.user_type.as_str()),
            ..Default::default()
        },
    )
    .await?;

    tx.commit().await?;
    info!("Account {} registered as {}", user.id, new.user_type.as_str());

    let account = load_account(pool, user).await?;
    Ok(Session::new(account, token))
}

pub async fn login(pool: &PgPool, config: &Config, req: &LoginRequest) -> Result<Session, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(req.email.trim())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(pool, user.id, config.token_ttl_hours).await?;
    info!("User {} logged in", user.id);

    let account = load_account(pool, user).await?;
    Ok(Session::new(account, token))
}

pub async fn logout(pool: &PgPool, token: &str) -> Result<(), AppError> {
    revoke_token(pool, token).await
}

pub async fn me(pool: &PgPool, user: &AuthUser) -> Result<Account, AppError> {
    let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    load_account(pool, row).await
}

/// `UPDATE user_profiles SET updated_at = NOW()[, col = $n]... WHERE user_id = $m`
pub fn push_profile_changes(qb: &mut QueryBuilder<'_, Postgres>, req: &ProfileUpdateRequest) {
    qb.push(" SET updated_at = NOW()");
    let fields = [
        ("headline", &req.headline),
        ("bio", &req.bio),
        ("phone", &req.phone),
        ("city", &req.city),
        ("website", &req.website),
        ("resume_path", &req.resume_path),
        ("avatar_path", &req.avatar_path),
    ];
    for (column, value) in fields {
        if let Some(value) = value {
            qb.push(format!(", {column} = ")).push_bind(value.trim().to_string());
        }
    }
}

pub async fn update_profile(
    pool: &PgPool,
    user: &AuthUser,
    req: &ProfileUpdateRequest,
) -> Result<Account, AppError> {
    validate_profile(req)?;

    let mut tx = pool.begin().await?;

    if let Some(name) = req.name.as_deref() {
        sqlx::query("UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2")
            .bind(name.trim())
            .bind(user.user_id)
            .execute(&mut *tx)
            .await?;
    }

    let mut qb = QueryBuilder::new("UPDATE user_profiles");
    push_profile_changes(&mut qb, req);
    qb.push(" WHERE user_id = ").push_bind(user.user_id);
    qb.build().execute(&mut *tx).await?;

    tx.commit().await?;

    me(pool, user).await
}

pub async fn sync_profile_skills(
    pool: &PgPool,
    user: &AuthUser,
    req: &ProfileSkillsRequest,
) -> Result<Vec<AttachedSkill>, AppError> {
    validate_profile_skills(req)?;

    let mut tx = pool.begin().await?;
    sync_skills(&mut *tx, SkillableType::User, user.user_id, &req.skills).await?;
    tx.commit().await?;

    attached_skills(pool, SkillableType::User, user.user_id).await
}
