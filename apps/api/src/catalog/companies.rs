use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::search::push_accepting_applications;
use crate::models::catalog::Category;
use crate::models::company::Company;
use crate::response::{Page, Paginated};

#[derive(Debug, Default, Deserialize)]
pub struct CompanyFilter {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub open_jobs_count: i64,
}

pub async fn find_company(pool: &PgPool, id: Uuid) -> Result<Company, AppError> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))
}

pub async fn company_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Company>, AppError> {
    Ok(
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

fn push_company_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a CompanyFilter) {
    qb.push(" WHERE status = 'active'");
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        qb.push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
}

/// Escapes `%`, `_` and `\` for use inside an ILIKE pattern.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub async fn list_companies(
    pool: &PgPool,
    filter: &CompanyFilter,
    page: Page,
) -> Result<Paginated<Company>, AppError> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM companies");
    push_company_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut rows = QueryBuilder::new("SELECT * FROM companies");
    push_company_filter(&mut rows, filter);
    rows.push(" ORDER BY is_featured DESC, name ASC LIMIT ")
        .push_bind(page.per_page)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let companies = rows.build_query_as::<Company>().fetch_all(pool).await?;

    Ok(Paginated::new(companies, page, total))
}

pub async fn company_detail(pool: &PgPool, id: Uuid) -> Result<CompanyDetail, AppError> {
    let company = find_company(pool, id).await?;

    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM jobs WHERE company_id = ");
    qb.push_bind(id).push(" AND ");
    push_accepting_applications(&mut qb, "jobs");
    let open_jobs_count: i64 = qb.build_query_scalar().fetch_one(pool).await?;

    Ok(CompanyDetail {
        company,
        open_jobs_count,
    })
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("rust"), "rust");
    }

    #[test]
    fn test_company_filter_sql() {
        let filter = CompanyFilter {
            search: Some("  acme ".into()),
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM companies");
        push_company_filter(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM companies WHERE status = 'active' AND name ILIKE $1"
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = CompanyFilter {
            search: Some("   ".into()),
        };
        let mut qb = QueryBuilder::new("SELECT * FROM companies");
        push_company_filter(&mut qb, &filter);
        assert!(!qb.sql().contains("ILIKE"));
    }
}
