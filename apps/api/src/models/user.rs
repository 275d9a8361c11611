use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Business classification of an account. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Jobseeker,
    Employer,
    Admin,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Jobseeker => "jobseeker",
            UserType::Employer => "employer",
            UserType::Admin => "admin",
        }
    }

    pub fn is_employer(self) -> bool {
        self == UserType::Employer
    }

    pub fn is_jobseeker(self) -> bool {
        self == UserType::Jobseeker
    }

    pub fn is_admin(self) -> bool {
        self == UserType::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub resume_path: Option<String>,
    pub avatar_path: Option<String>,
    /// Raw settings document; read through `settings::EmployerSettings`.
    #[serde(skip_serializing)]
    pub settings: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
