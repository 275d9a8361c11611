//! Employer settings document.
//!
//! Stored as one JSONB value on `user_profiles.settings`. Every field has a
//! default applied when the document is read, so older or partial documents
//! always deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, FieldErrors};

const PLANS: &[&str] = &["free", "basic", "premium", "enterprise"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployerSettings {
    pub general: GeneralSettings,
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub security: SecuritySettings,
    pub integrations: IntegrationSettings,
    pub billing: BillingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Setting this renames the employer's company.
    pub company_name: Option<String>,
    pub timezone: String,
    pub language: String,
    pub currency: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            company_name: None,
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email_new_applications: bool,
    pub email_application_updates: bool,
    pub email_weekly_digest: bool,
    pub email_marketing: bool,
    pub push_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_new_applications: true,
            email_application_updates: true,
            email_weekly_digest: true,
            email_marketing: false,
            push_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub show_company_profile: bool,
    pub show_salary_ranges: bool,
    pub allow_candidate_messages: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_company_profile: true,
            show_salary_ranges: true,
            allow_candidate_messages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub two_factor_enabled: bool,
    pub login_alerts: bool,
    pub session_timeout_minutes: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            two_factor_enabled: false,
            login_alerts: true,
            session_timeout_minutes: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub slack_webhook_url: Option<String>,
    pub calendar_sync: bool,
    pub ats_provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    pub plan: String,
    pub billing_email: Option<String>,
    pub auto_renew: bool,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            plan: "free".to_string(),
            billing_email: None,
            auto_renew: true,
        }
    }
}

/// Applies `patch` onto `base`. Objects merge key by key, a `null` removes the
/// key so its default applies again, anything else replaces.
pub fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    base.remove(&key);
                } else {
                    merge(base.entry(key).or_insert(Value::Null), value);
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

impl EmployerSettings {
    /// Reads a stored document. A non-object value (e.g. a fresh `NULL`
    /// column) yields the defaults.
    pub fn from_document(doc: &Value) -> Result<Self, AppError> {
        if !doc.is_object() {
            return Ok(Self::default());
        }
        serde_json::from_value(doc.clone()).map_err(|e| {
            AppError::Validation(FieldErrors::single("settings", e.to_string()))
        })
    }

    /// Merges `patch` onto the stored document and validates the result.
    /// Returns the document to store, which holds only explicitly set keys,
    /// alongside the settings it resolves to.
    pub fn apply_patch(stored: Value, patch: Value) -> Result<(Value, Self), AppError> {
        let mut doc = if stored.is_object() {
            stored
        } else {
            Value::Object(Default::default())
        };
        merge(&mut doc, patch);
        let settings = Self::from_document(&doc)?;
        settings.validate()?;
        Ok((doc, settings))
    }

    /// Trimmed, non-empty company name when one was set.
    pub fn company_name(&self) -> Option<&str> {
        self.general
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();

        if let Some(name) = self.company_name() {
            if name.chars().count() > 255 {
                errors.add("general.company_name", "The company name may not be greater than 255 characters");
            }
        }
        let currency = &self.general.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.add("general.currency", "The currency must be a 3-letter code");
        }
        if !(5..=1440).contains(&self.security.session_timeout_minutes) {
            errors.add(
                "security.session_timeout_minutes",
                "The session timeout must be between 5 and 1440 minutes",
            );
        }
        if let Some(url) = self.integrations.slack_webhook_url.as_deref() {
            if !url.starts_with("https://") {
                errors.add("integrations.slack_webhook_url", "The webhook URL must use https");
            }
        }
        if !PLANS.contains(&self.billing.plan.as_str()) {
            errors.add("billing.plan", format!("The plan must be one of: {}", PLANS.join(", ")));
        }
        if let Some(email) = self.billing.billing_email.as_deref() {
            if !email.contains('@') {
                errors.add("billing.billing_email", "The billing email must be a valid email address");
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_yields_defaults() {
        let settings = EmployerSettings::from_document(&json!({})).unwrap();
        assert_eq!(settings, EmployerSettings::default());
        assert!(settings.notifications.email_new_applications);
        assert_eq!(settings.security.session_timeout_minutes, 120);
        assert_eq!(settings.billing.plan, "free");
    }

    #[test]
    fn test_null_document_yields_defaults() {
        assert_eq!(
            EmployerSettings::from_document(&Value::Null).unwrap(),
            EmployerSettings::default()
        );
    }

    #[test]
    fn test_partial_group_keeps_other_defaults() {
        let settings =
            EmployerSettings::from_document(&json!({ "privacy": { "show_salary_ranges": false } }))
                .unwrap();
        assert!(!settings.privacy.show_salary_ranges);
        assert!(settings.privacy.show_company_profile);
    }

    #[test]
    fn test_merge_is_deep() {
        let mut doc = json!({
            "general": { "timezone": "Europe/Berlin", "language": "de" },
            "billing": { "plan": "basic" }
        });
        merge(&mut doc, json!({ "general": { "language": "fr" } }));
        assert_eq!(doc["general"]["timezone"], "Europe/Berlin");
        assert_eq!(doc["general"]["language"], "fr");
        assert_eq!(doc["billing"]["plan"], "basic");
    }

    #[test]
    fn test_merge_null_restores_default() {
        let mut doc = json!({ "security": { "session_timeout_minutes": 30 } });
        merge(&mut doc, json!({ "security": { "session_timeout_minutes": null } }));
        let settings = EmployerSettings::from_document(&doc).unwrap();
        assert_eq!(settings.security.session_timeout_minutes, 120);
    }

    #[test]
    fn test_applied_patch_stores_only_set_keys() {
        let stored = json!({ "general": { "currency": "EUR" } });
        let (doc, settings) =
            EmployerSettings::apply_patch(stored, json!({ "billing": { "plan": "pro" } })).unwrap();
        assert_eq!(
            doc,
            json!({ "general": { "currency": "EUR" }, "billing": { "plan": "pro" } })
        );
        assert_eq!(settings.general.timezone, "UTC");
        assert!(doc["security"].is_null());
    }

    #[test]
    fn test_applied_patch_on_null_column() {
        let (doc, _) = EmployerSettings::apply_patch(
            Value::Null,
            json!({ "general": { "language": "de" } }),
        )
        .unwrap();
        assert_eq!(doc, json!({ "general": { "language": "de" } }));
    }

    #[test]
    fn test_applied_patch_rejects_invalid_result() {
        let err = EmployerSettings::apply_patch(json!({}), json!({ "general": { "currency": "euro" } }))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.contains("general.currency")));
    }

    #[test]
    fn test_wrong_type_is_validation_error() {
        let err = EmployerSettings::from_document(&json!({ "privacy": { "show_salary_ranges": "no" } }))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_validate_reports_dotted_fields() {
        let mut settings = EmployerSettings::default();
        settings.security.session_timeout_minutes = 1;
        settings.billing.plan = "platinum".into();
        let Err(AppError::Validation(errors)) = settings.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.contains("security.session_timeout_minutes"));
        assert!(errors.contains("billing.plan"));
        assert!(!errors.contains("general.currency"));
    }

    #[test]
    fn test_company_name_trimmed() {
        let mut settings = EmployerSettings::default();
        settings.general.company_name = Some("  ".into());
        assert_eq!(settings.company_name(), None);
        settings.general.company_name = Some(" Acme ".into());
        assert_eq!(settings.company_name(), Some("Acme"));
    }
}
