use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

const MAX_NAME_LENGTH: u64 = 80;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "technology_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TechnologyCategory {
    Language,
    Framework,
    Database,
    Tool,
    Platform,
    Other,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Technology {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category: TechnologyCategory,
    pub created_at: DateTime<Utc>,
}

/// Technology columns as they appear when joined onto a skill row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TechnologySummary {
    #[sqlx(rename = "technology_id")]
    pub id: Uuid,
    #[sqlx(rename = "technology_name")]
    pub name: String,
    #[sqlx(rename = "technology_slug")]
    pub slug: String,
    #[sqlx(rename = "technology_category")]
    pub category: TechnologyCategory,
}

impl From<&Technology> for TechnologySummary {
    fn from(technology: &Technology) -> Self {
        TechnologySummary {
            id: technology.id,
            name: technology.name.clone(),
            slug: technology.slug.clone(),
            category: technology.category,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnologySearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

impl TechnologySearchQuery {
    /// Trimmed search term, `None` when blank.
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct TechnologySearchResponse {
    pub data: Vec<Technology>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnologyListQuery {
    pub category: Option<TechnologyCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTechnologyRequest {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH, message = "Name must be between 1 and 80 characters"))]
    pub name: String,

    pub category: TechnologyCategory,
}

#[derive(Debug, Clone)]
pub struct TechnologyInsert {
    pub name: String,
    pub slug: String,
    pub category: TechnologyCategory,
}

impl TryFrom<NewTechnologyRequest> for TechnologyInsert {
    type Error = ValidationErrors;

    fn try_from(request: NewTechnologyRequest) -> Result<Self, Self::Error> {
        request.validate()?;

        let name = request.name.trim().to_string();
        let slug = slug::slugify(&name);

        if slug.is_empty() {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("slug_empty");
            error.message = Some(Cow::Borrowed("Name must contain at least one letter or digit"));
            errors.add("name", error);
            return Err(errors);
        }

        Ok(TechnologyInsert {
            name,
            slug,
            category: request.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_has_no_term() {
        let query = TechnologySearchQuery { q: Some("   ".into()), limit: None };
        assert_eq!(query.term(), None);
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(TechnologySearchQuery::default().effective_limit(), DEFAULT_SEARCH_LIMIT);

        let huge = TechnologySearchQuery { q: None, limit: Some(10_000) };
        assert_eq!(huge.effective_limit(), MAX_SEARCH_LIMIT);

        let zero = TechnologySearchQuery { q: None, limit: Some(0) };
        assert_eq!(zero.effective_limit(), 1);
    }

    #[test]
    fn insert_derives_slug_from_name() {
        let insert = TechnologyInsert::try_from(NewTechnologyRequest {
            name: "  Ruby on Rails ".into(),
            category: TechnologyCategory::Framework,
        })
        .unwrap();

        assert_eq!(insert.name, "Ruby on Rails");
        assert_eq!(insert.slug, "ruby-on-rails");
    }

    #[test]
    fn punctuation_only_name_is_rejected() {
        let result = TechnologyInsert::try_from(NewTechnologyRequest {
            name: "!!!".into(),
            category: TechnologyCategory::Other,
        });

        assert!(result.unwrap_err().field_errors().contains_key("name"));
    }
}
