use serde::Deserialize;

use crate::catalog::skills::{validate_skill_refs, SkillRef};
use crate::errors::{AppError, FieldErrors};
use crate::models::user::UserType;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub user_type: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    /// Lowercased.
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    /// Present exactly when `user_type` is employer.
    pub company_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile fields. Absent or `null` leaves the column unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    pub resume_path: Option<String>,
    pub avatar_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileSkillsRequest {
    #[serde(default)]
    pub skills: Vec<SkillRef>,
}

/// Loose structural check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_register(req: &RegisterRequest) -> Result<NewAccount, AppError> {
    let mut errors = FieldErrors::new();

    let name = text(&req.name);
    match name {
        None => errors.add("name", "The name field is required"),
        Some(n) if n.chars().count() > MAX_NAME_LEN => errors.add(
            "name",
            format!("The name may not be greater than {MAX_NAME_LEN} characters"),
        ),
        Some(_) => {}
    }

    let email = text(&req.email).map(str::to_lowercase);
    match email.as_deref() {
        None => errors.add("email", "The email field is required"),
        Some(e) if !is_valid_email(e) => errors.add("email", "The email must be a valid email address"),
        Some(_) => {}
    }

    let password = req.password.as_deref().unwrap_or_default();
    if password.is_empty() {
        errors.add("password", "The password field is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("The password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if req.password_confirmation.as_deref() != Some(password) {
        errors.add("password", "The password confirmation does not match");
    }

    let user_type = match text(&req.user_type) {
        Some("jobseeker") => Some(UserType::Jobseeker),
        Some("employer") => Some(UserType::Employer),
        None => {
            errors.add("user_type", "The user type field is required");
            None
        }
        Some(_) => {
            errors.add("user_type", "The user type must be jobseeker or employer");
            None
        }
    };

    let company_name = text(&req.company_name);
    if user_type == Some(UserType::Employer) && company_name.is_none() {
        errors.add("company_name", "The company name field is required for employers");
    }

    errors.into_result()?;
    let (Some(name), Some(email), Some(user_type)) = (name, email, user_type) else {
        return Err(AppError::Validation(FieldErrors::single(
            "body",
            "The given data was invalid",
        )));
    };

    Ok(NewAccount {
        name: name.to_string(),
        email,
        password: password.to_string(),
        user_type,
        company_name: if user_type.is_employer() {
            company_name.map(str::to_string)
        } else {
            None
        },
    })
}

pub fn validate_profile(req: &ProfileUpdateRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(name) = req.name.as_deref() {
        if name.trim().is_empty() {
            errors.add("name", "The name may not be empty");
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.add(
                "name",
                format!("The name may not be greater than {MAX_NAME_LEN} characters"),
            );
        }
    }
    if let Some(website) = req.website.as_deref() {
        if !(website.starts_with("http://") || website.starts_with("https://")) {
            errors.add("website", "The website must be a valid URL");
        }
    }
    if req.phone.as_deref().is_some_and(|p| p.chars().count() > 32) {
        errors.add("phone", "The phone may not be greater than 32 characters");
    }
    errors.into_result()
}

pub fn validate_profile_skills(req: &ProfileSkillsRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    validate_skill_refs(&req.skills, &mut errors);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            name: Some("Ada Lovelace".into()),
            email: Some("Ada@Example.com".into()),
            password: Some("analytical".into()),
            password_confirmation: Some("analytical".into()),
            user_type: Some("jobseeker".into()),
            company_name: None,
        }
    }

    fn fields(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_jobseeker() {
        let account = validate_register(&request()).unwrap();
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.user_type, UserType::Jobseeker);
        assert_eq!(account.company_name, None);
    }

    #[test]
    fn test_employer_needs_company_name() {
        let mut req = request();
        req.user_type = Some("employer".into());
        let errors = fields(validate_register(&req).unwrap_err());
        assert!(errors.contains("company_name"));

        req.company_name = Some(" Acme Ltd ".into());
        let account = validate_register(&req).unwrap();
        assert_eq!(account.company_name.as_deref(), Some("Acme Ltd"));
    }

    #[test]
    fn test_admin_cannot_self_register() {
        let mut req = request();
        req.user_type = Some("admin".into());
        assert!(fields(validate_register(&req).unwrap_err()).contains("user_type"));
    }

    #[test]
    fn test_password_rules() {
        let mut req = request();
        req.password = Some("short".into());
        req.password_confirmation = Some("short".into());
        assert!(fields(validate_register(&req).unwrap_err()).contains("password"));

        let mut req = request();
        req.password_confirmation = Some("different".into());
        assert!(fields(validate_register(&req).unwrap_err()).contains("password"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@@b.co"));
    }

    #[test]
    fn test_profile_rules() {
        assert!(validate_profile(&ProfileUpdateRequest::default()).is_ok());
        let req = ProfileUpdateRequest {
            website: Some("example.com".into()),
            ..Default::default()
        };
        assert!(fields(validate_profile(&req).unwrap_err()).contains("website"));
    }
}
