use sqlx::PgExecutor;
use uuid::Uuid;

use crate::catalog::slug::slugify;
use crate::errors::{AppError, FieldErrors};

/// Resolves a free-text city to a location row, creating it on first use.
///
/// The slug is the identity: "New York" and "new  york" land on the same row,
/// and the first writer's display name is kept.
pub async fn find_or_create_location<'e, E: PgExecutor<'e>>(
    executor: E,
    city: &str,
) -> Result<Uuid, AppError> {
    let slug = slugify(city);
    if slug.is_empty() {
        return Err(AppError::Validation(FieldErrors::single(
            "location",
            "The location must contain letters or digits",
        )));
    }

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO locations (name, slug)
        VALUES ($1, $2)
        ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
        RETURNING id
        "#,
    )
    .bind(city.trim())
    .bind(&slug)
    .fetch_one(executor)
    .await?;
    Ok(id)
}
