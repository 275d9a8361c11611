use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::tokens::resolve_token;
use crate::errors::AppError;
use crate::models::user::UserType;
use crate::state::AppState;

/// The authenticated caller. Resolved from `Authorization: Bearer <token>` and
/// passed by reference into every service function that needs to know who is
/// acting.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub name: String,
    pub email: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user_type.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        require(self.user_type.is_admin())
    }

    pub fn require_employer(&self) -> Result<(), AppError> {
        require(self.user_type.is_employer())
    }

    /// Employers and admins both manage postings.
    pub fn require_employer_or_admin(&self) -> Result<(), AppError> {
        require(self.user_type.is_employer() || self.user_type.is_admin())
    }

    pub fn require_jobseeker(&self) -> Result<(), AppError> {
        require(self.user_type.is_jobseeker())
    }

    /// Owner of the resource, or an admin.
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }

    pub fn ensure_can_manage(&self, owner_id: Uuid) -> Result<(), AppError> {
        require(self.can_manage(owner_id))
    }
}

fn require(allowed: bool) -> Result<(), AppError> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Extracts the raw token from a `Bearer` authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        resolve_token(&state.db, token)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional caller for public routes. `None` when no bearer token was sent or
/// the token is unknown or expired; lookup failures still reject the request.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) => Ok(Self(resolve_token(&state.db, token).await?)),
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
pub(crate) fn user(user_type: UserType) -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        user_type,
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn test_bearer_token_parsed() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer abc123")), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_owner_can_manage() {
        let employer = user(UserType::Employer);
        assert!(employer.can_manage(employer.user_id));
        assert!(!employer.can_manage(Uuid::new_v4()));
    }

    #[test]
    fn test_admin_can_manage_anything() {
        let admin = user(UserType::Admin);
        assert!(admin.ensure_can_manage(Uuid::new_v4()).is_ok());
    }

    fn unreachable_state() -> AppState {
        let db = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(1))
            .connect_lazy("postgres://jobboard@127.0.0.1:1/jobboard")
            .unwrap();
        AppState {
            db,
            config: crate::config::Config::default(),
            insights: std::sync::Arc::new(crate::analytics::insights::PlaceholderInsights),
        }
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::get("/jobs/1");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_optional_caller_without_header_is_anonymous() {
        let state = unreachable_state();
        let MaybeAuthUser(viewer) = MaybeAuthUser::from_request_parts(&mut parts(None), &state)
            .await
            .unwrap();
        assert!(viewer.is_none());

        let mut basic = parts(Some("Basic dXNlcjpwYXNz"));
        let MaybeAuthUser(viewer) = MaybeAuthUser::from_request_parts(&mut basic, &state)
            .await
            .unwrap();
        assert!(viewer.is_none());
    }

    #[tokio::test]
    async fn test_optional_caller_propagates_lookup_failure() {
        let state = unreachable_state();
        let err = MaybeAuthUser::from_request_parts(&mut parts(Some("Bearer abc123")), &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_role_requirements() {
        let seeker = user(UserType::Jobseeker);
        assert!(seeker.require_jobseeker().is_ok());
        assert!(matches!(seeker.require_employer(), Err(AppError::Forbidden)));
        assert!(matches!(seeker.require_admin(), Err(AppError::Forbidden)));
        assert!(user(UserType::Admin).require_employer_or_admin().is_ok());
    }
}
