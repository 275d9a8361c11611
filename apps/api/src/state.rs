use std::sync::Arc;

use sqlx::PgPool;

use crate::analytics::insights::InsightProvider;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Source of the dashboard figures not derived from stored rows.
    /// Default: `PlaceholderInsights`.
    pub insights: Arc<dyn InsightProvider>,
}
