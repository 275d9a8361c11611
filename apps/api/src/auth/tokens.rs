//! Opaque bearer tokens. The plain token is returned to the client once; only
//! its SHA-256 digest is stored.

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;

const TOKEN_LENGTH: usize = 40;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Stores a fresh token for `user_id` and returns the plain value.
pub async fn issue_token<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    ttl_hours: i64,
) -> Result<String, AppError> {
    let token = generate_token();
    sqlx::query("INSERT INTO auth_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(Utc::now() + Duration::hours(ttl_hours))
        .execute(executor)
        .await?;
    Ok(token)
}

pub async fn revoke_token(pool: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Looks up the account behind an unexpired token.
pub async fn resolve_token(pool: &PgPool, token: &str) -> Result<Option<AuthUser>, AppError> {
    let user = sqlx::query_as::<_, AuthUser>(
        r#"
        SELECT u.id AS user_id, p.user_type, u.name, u.email
        FROM auth_tokens t
        JOIN users u ON u.id = t.user_id
        JOIN user_profiles p ON p.user_id = u.id
        WHERE t.token_hash = $1 AND t.expires_at > NOW()
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_is_stable_hex_sha256() {
        let h = hash_token("abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("abc"), h);
    }
}
