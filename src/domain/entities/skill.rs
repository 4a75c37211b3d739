use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::technology::TechnologySummary;

pub const MAX_YEARS_EXPERIENCE: i32 = 60;
pub const MAX_LIST_ITEMS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Learning,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Members,
    Private,
}

/// Who is looking at a user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Member,
    Owner,
}

impl Viewer {
    pub fn resolve(owner_id: Uuid, viewer_id: Option<Uuid>) -> Self {
        match viewer_id {
            Some(id) if id == owner_id => Viewer::Owner,
            Some(_) => Viewer::Member,
            None => Viewer::Anonymous,
        }
    }
}

impl Visibility {
    pub fn visible_to(self, viewer: Viewer) -> bool {
        match (self, viewer) {
            (_, Viewer::Owner) => true,
            (Visibility::Public, _) => true,
            (Visibility::Members, Viewer::Member) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level: SkillLevel,
    pub years_experience: i32,
    pub visibility: Visibility,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A skill row joined with its catalog entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SkillDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub skill: Skill,

    #[sqlx(flatten)]
    pub technology: TechnologySummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSkillRequest {
    pub technology_id: Uuid,

    pub level: SkillLevel,

    #[validate(range(min = 0, max = MAX_YEARS_EXPERIENCE, message = "Years of experience must be between 0 and 60"))]
    #[serde(default)]
    pub years_experience: i32,

    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct SkillInsert {
    pub user_id: Uuid,
    pub technology_id: Uuid,
    pub level: SkillLevel,
    pub years_experience: i32,
    pub visibility: Visibility,
}

impl NewSkillRequest {
    pub fn prepare_for_insert(&self, user_id: Uuid) -> SkillInsert {
        SkillInsert {
            user_id,
            technology_id: self.technology_id,
            level: self.level,
            years_experience: self.years_experience,
            visibility: self.visibility,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateSkillRequest {
    pub level: Option<SkillLevel>,

    #[validate(range(min = 0, max = MAX_YEARS_EXPERIENCE, message = "Years of experience must be between 0 and 60"))]
    pub years_experience: Option<i32>,

    pub visibility: Option<Visibility>,
}

impl UpdateSkillRequest {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.years_experience.is_none() && self.visibility.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReorderSkillsRequest {
    #[validate(length(max = MAX_LIST_ITEMS, message = "Too many skills in one request"))]
    pub skill_ids: Vec<Uuid>,
}
