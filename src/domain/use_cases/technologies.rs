use std::sync::Arc;

use crate::{
    entities::technology::{
        NewTechnologyRequest, Technology, TechnologyInsert, TechnologyListQuery,
        TechnologySearchQuery, TechnologySearchResponse,
    },
    errors::AppError,
    repositories::technology::TechnologyRepository,
};

pub struct TechnologyHandler<R>
where
    R: TechnologyRepository + ?Sized,
{
    pub technology_repo: Arc<R>,
}

impl<R> TechnologyHandler<R>
where
    R: TechnologyRepository + ?Sized,
{
    pub fn new(technology_repo: Arc<R>) -> Self {
        TechnologyHandler { technology_repo }
    }

    /// Blank queries return no rows without touching the store.
    pub async fn search(&self, query: &TechnologySearchQuery) -> Result<TechnologySearchResponse, AppError> {
        let data = match query.term() {
            Some(term) => self.technology_repo.search(term, query.effective_limit()).await?,
            None => Vec::new(),
        };

        Ok(TechnologySearchResponse { data })
    }

    pub async fn list(&self, query: &TechnologyListQuery) -> Result<Vec<Technology>, AppError> {
        self.technology_repo.list(query.category).await
    }

    pub async fn create(&self, request: NewTechnologyRequest) -> Result<Technology, AppError> {
        let insert = TechnologyInsert::try_from(request)?;
        let technology = self.technology_repo.create(&insert).await?;

        tracing::info!(technology_id = %technology.id, slug = %technology.slug, "Technology added to catalog");
        Ok(technology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    use crate::entities::technology::MAX_SEARCH_LIMIT;
    use crate::repositories::technology::MockTechnologyRepository;

    #[actix_rt::test]
    async fn blank_search_returns_empty_data() {
        let mut repo = MockTechnologyRepository::new();
        repo.expect_search().never();

        let handler = TechnologyHandler::new(Arc::new(repo));
        let response = handler
            .search(&TechnologySearchQuery { q: Some("  ".into()), limit: Some(5) })
            .await
            .unwrap();

        assert!(response.data.is_empty());
    }

    #[actix_rt::test]
    async fn search_passes_trimmed_term_and_capped_limit() {
        let mut repo = MockTechnologyRepository::new();
        repo.expect_search()
            .with(eq("rust"), eq(MAX_SEARCH_LIMIT))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let handler = TechnologyHandler::new(Arc::new(repo));
        handler
            .search(&TechnologySearchQuery { q: Some(" rust ".into()), limit: Some(500) })
            .await
            .unwrap();
    }
}
