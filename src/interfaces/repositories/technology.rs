use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::technology::{Technology, TechnologyCategory, TechnologyInsert},
    errors::{unique_violation, AppError},
    repositories::sqlx_repo::SqlxTechnologyRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TechnologyRepository: Send + Sync {
    /// Case-insensitive substring match on name, at most `limit` rows.
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Technology>, AppError>;
    async fn list(&self, category: Option<TechnologyCategory>) -> Result<Vec<Technology>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Technology>, AppError>;
    async fn create(&self, technology: &TechnologyInsert) -> Result<Technology, AppError>;
}

impl SqlxTechnologyRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxTechnologyRepo { pool }
    }
}

/// Escapes LIKE metacharacters so user input matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl TechnologyRepository for SqlxTechnologyRepo {
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Technology>, AppError> {
        let technologies = sqlx::query_as::<_, Technology>(
            r#"
            SELECT * FROM technologies
            WHERE name ILIKE $1 OR slug ILIKE $1
            ORDER BY (LOWER(name) = LOWER($2)) DESC, name ASC
            LIMIT $3
            "#
        )
        .bind(like_pattern(term))
        .bind(term)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(technologies)
    }

    async fn list(&self, category: Option<TechnologyCategory>) -> Result<Vec<Technology>, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM technologies");

        if let Some(category) = category {
            query.push(" WHERE category = ").push_bind(category);
        }
        query.push(" ORDER BY name ASC");

        let technologies = query
            .build_query_as::<Technology>()
            .fetch_all(&self.pool)
            .await?;

        Ok(technologies)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Technology>, AppError> {
        let technology = sqlx::query_as::<_, Technology>("SELECT * FROM technologies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(technology)
    }

    async fn create(&self, technology: &TechnologyInsert) -> Result<Technology, AppError> {
        sqlx::query_as::<_, Technology>(
            r#"
            INSERT INTO technologies (name, slug, category)
            VALUES ($1, $2, $3)
            RETURNING *
            "#
        )
        .bind(&technology.name)
        .bind(&technology.slug)
        .bind(technology.category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::Conflict(format!("Technology '{}' already exists", technology.name)),
            None => AppError::from(e),
        })
    }
}
