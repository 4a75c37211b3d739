use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::skill::{NewSkillRequest, ReorderSkillsRequest, SkillDetail, UpdateSkillRequest, Viewer},
    errors::AppError,
    repositories::{skill::SkillRepository, technology::TechnologyRepository},
    utils::valid_uuid::valid_uuid,
};

pub struct SkillHandler<S, T>
where
    S: SkillRepository + ?Sized,
    T: TechnologyRepository + ?Sized,
{
    pub skill_repo: Arc<S>,
    pub technology_repo: Arc<T>,
}

impl<S, T> SkillHandler<S, T>
where
    S: SkillRepository + ?Sized,
    T: TechnologyRepository + ?Sized,
{
    pub fn new(skill_repo: Arc<S>, technology_repo: Arc<T>) -> Self {
        SkillHandler { skill_repo, technology_repo }
    }

    /// The owner's full list in display order.
    pub async fn list_own(&self, user_id: Uuid) -> Result<Vec<SkillDetail>, AppError> {
        self.skill_repo.list_for_user(user_id).await
    }

    /// `owner_id`'s list as seen by `viewer_id`.
    pub async fn list_visible(&self, owner_id: Uuid, viewer_id: Option<Uuid>) -> Result<Vec<SkillDetail>, AppError> {
        let viewer = Viewer::resolve(owner_id, viewer_id);

        let skills = self.skill_repo.list_for_user(owner_id).await?;

        Ok(skills
            .into_iter()
            .filter(|detail| detail.skill.visibility.visible_to(viewer))
            .collect())
    }

    pub async fn create_skill(&self, user_id: Uuid, request: NewSkillRequest) -> Result<SkillDetail, AppError> {
        request.validate()?;

        if self.technology_repo.find_by_id(request.technology_id).await?.is_none() {
            return Err(AppError::field("technology_id", "Unknown technology"));
        }

        // Fast path for the common case; the unique constraint still decides races.
        if self.skill_repo.has_technology(user_id, request.technology_id).await? {
            return Err(AppError::field("technology_id", "This technology is already in your skills"));
        }

        self.skill_repo.create_skill(&request.prepare_for_insert(user_id)).await
    }

    pub async fn update_skill(&self, user_id: Uuid, skill_id: &str, changes: UpdateSkillRequest) -> Result<SkillDetail, AppError> {
        changes.validate()?;
        let skill_id = valid_uuid(skill_id)?;

        if changes.is_empty() {
            return self.skill_repo
                .find_for_user(user_id, skill_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Skill not found".into()));
        }

        self.skill_repo.update_skill(user_id, skill_id, &changes).await
    }

    pub async fn delete_skill(&self, user_id: Uuid, skill_id: &str) -> Result<(), AppError> {
        let skill_id = valid_uuid(skill_id)?;
        self.skill_repo.delete_skill(user_id, skill_id).await
    }

    /// Rewrites positions to follow `request.skill_ids`, which must name
    /// every skill the user owns exactly once.
    pub async fn reorder_skills(&self, user_id: Uuid, request: ReorderSkillsRequest) -> Result<Vec<SkillDetail>, AppError> {
        request.validate()?;
        self.skill_repo.reorder_skills(user_id, &request.skill_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::entities::skill::{Skill, SkillLevel, Visibility};
    use crate::entities::technology::{Technology, TechnologyCategory, TechnologySummary};
    use crate::repositories::{skill::MockSkillRepository, technology::MockTechnologyRepository};

    fn technology(id: Uuid) -> Technology {
        Technology {
            id,
            name: "Rust".into(),
            slug: "rust".into(),
            category: TechnologyCategory::Language,
            created_at: Utc::now(),
        }
    }

    fn detail(owner: Uuid, visibility: Visibility, position: i32) -> SkillDetail {
        let technology = technology(Uuid::new_v4());
        SkillDetail {
            skill: Skill {
                id: Uuid::new_v4(),
                user_id: owner,
                level: SkillLevel::Advanced,
                years_experience: 3,
                visibility,
                position,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            technology: TechnologySummary::from(&technology),
        }
    }

    fn request(technology_id: Uuid) -> NewSkillRequest {
        NewSkillRequest {
            technology_id,
            level: SkillLevel::Intermediate,
            years_experience: 2,
            visibility: Visibility::Public,
        }
    }

    #[actix_rt::test]
    async fn duplicate_technology_is_a_field_error() {
        let user_id = Uuid::new_v4();
        let technology_id = Uuid::new_v4();

        let mut technologies = MockTechnologyRepository::new();
        technologies
            .expect_find_by_id()
            .returning(move |id| Ok(Some(technology(id))));

        let mut skills = MockSkillRepository::new();
        skills.expect_has_technology().returning(|_, _| Ok(true));
        skills.expect_create_skill().never();

        let handler = SkillHandler::new(Arc::new(skills), Arc::new(technologies));
        let err = handler.create_skill(user_id, request(technology_id)).await.unwrap_err();

        match err {
            AppError::ValidationError(fields) => assert_eq!(fields[0].field, "technology_id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_rt::test]
    async fn unknown_technology_is_rejected_before_insert() {
        let mut technologies = MockTechnologyRepository::new();
        technologies.expect_find_by_id().returning(|_| Ok(None));

        let mut skills = MockSkillRepository::new();
        skills.expect_create_skill().never();

        let handler = SkillHandler::new(Arc::new(skills), Arc::new(technologies));
        let result = handler.create_skill(Uuid::new_v4(), request(Uuid::new_v4())).await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[actix_rt::test]
    async fn out_of_range_years_never_reach_the_store() {
        let mut skills = MockSkillRepository::new();
        skills.expect_create_skill().never();

        let handler = SkillHandler::new(Arc::new(skills), Arc::new(MockTechnologyRepository::new()));
        let mut bad = request(Uuid::new_v4());
        bad.years_experience = 99;

        assert!(matches!(
            handler.create_skill(Uuid::new_v4(), bad).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[actix_rt::test]
    async fn visitors_only_see_what_visibility_allows() {
        let owner = Uuid::new_v4();
        let list = vec![
            detail(owner, Visibility::Public, 1),
            detail(owner, Visibility::Members, 2),
            detail(owner, Visibility::Private, 3),
        ];

        let mut skills = MockSkillRepository::new();
        skills
            .expect_list_for_user()
            .returning(move |_| Ok(list.clone()));

        let handler = SkillHandler::new(Arc::new(skills), Arc::new(MockTechnologyRepository::new()));

        assert_eq!(handler.list_visible(owner, None).await.unwrap().len(), 1);
        assert_eq!(handler.list_visible(owner, Some(Uuid::new_v4())).await.unwrap().len(), 2);
        assert_eq!(handler.list_visible(owner, Some(owner)).await.unwrap().len(), 3);
    }

    #[actix_rt::test]
    async fn malformed_skill_id_is_bad_input() {
        let handler = SkillHandler::new(
            Arc::new(MockSkillRepository::new()),
            Arc::new(MockTechnologyRepository::new()),
        );

        assert!(matches!(
            handler.delete_skill(Uuid::new_v4(), "not-a-uuid").await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
