pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::analytics::handlers as analytics;
use crate::applications::handlers as applications;
use crate::catalog::handlers as catalog;
use crate::jobs::handlers as jobs;
use crate::settings::handlers as settings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/auth/register", post(accounts::handle_register))
        .route("/auth/login", post(accounts::handle_login))
        .route("/auth/logout", post(accounts::handle_logout))
        .route("/auth/me", get(accounts::handle_me))
        .route("/profile", put(accounts::handle_update_profile))
        .route("/profile/skills", put(accounts::handle_sync_skills))
        // Catalog
        .route("/categories", get(catalog::handle_list_categories))
        .route("/skills", get(catalog::handle_list_skills))
        .route("/companies", get(catalog::handle_list_companies))
        .route("/companies/:id", get(catalog::handle_get_company))
        // Jobs
        .route(
            "/jobs",
            get(jobs::handle_search_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/jobs/:id/featured", post(jobs::handle_toggle_featured))
        .route("/jobs/:id/premium", post(jobs::handle_toggle_premium))
        .route("/jobs/:id/close", post(jobs::handle_close_job))
        .route("/jobs/:id/apply", post(applications::handle_apply))
        .route("/employer/jobs", get(jobs::handle_list_owned_jobs))
        // Applications (applicant). POST takes the job id.
        .route("/applications", get(applications::handle_list_my_applications))
        .route(
            "/applications/:id",
            get(applications::handle_get_application)
                .post(applications::handle_apply)
                .delete(applications::handle_delete_own),
        )
        .route("/applications/:id/withdraw", post(applications::handle_withdraw))
        .route("/applications/:id/notes", put(applications::handle_candidate_notes))
        // Applications (employer)
        .route("/employer/applications", get(applications::handle_list_received))
        .route(
            "/employer/applications/:id",
            delete(applications::handle_employer_delete),
        )
        .route(
            "/employer/applications/:id/status",
            put(applications::handle_employer_status),
        )
        .route(
            "/employer/applications/:id/notes",
            put(applications::handle_employer_notes),
        )
        .route(
            "/employer/applications/:id/rating",
            put(applications::handle_rating),
        )
        .route(
            "/employer/applications/:id/favorite",
            post(applications::handle_favorite),
        )
        // Admin
        .route("/admin/dashboard", get(analytics::handle_admin_dashboard))
        .route("/admin/applications", get(applications::handle_admin_list))
        .route(
            "/admin/applications/:id",
            delete(applications::handle_admin_delete),
        )
        .route(
            "/admin/applications/:id/status",
            put(applications::handle_admin_status),
        )
        // Analytics & settings
        .route("/analytics/employer", get(analytics::handle_employer_analytics))
        .route(
            "/settings/employer",
            get(settings::handle_get_employer_settings)
                .put(settings::handle_update_employer_settings),
        )
        .with_state(state)
}
