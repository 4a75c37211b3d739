use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    domain::ordering::{next_position, plan_removal, plan_reorder},
    entities::skill::{SkillDetail, SkillInsert, UpdateSkillRequest},
    errors::{unique_violation, AppError},
    repositories::{positions::SKILLS, sqlx_repo::SqlxSkillRepo},
};

const SKILL_TECHNOLOGY_UNIQUE: &str = "skills_user_id_technology_id_key";

const SELECT_SKILL_DETAIL: &str = r#"
    SELECT
        s.id, s.user_id, s.level, s.years_experience, s.visibility,
        s.position, s.created_at, s.updated_at,
        t.id AS technology_id,
        t.name AS technology_name,
        t.slug AS technology_slug,
        t.category AS technology_category
    FROM skills s
    JOIN technologies t ON t.id = s.technology_id
"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// Skills of `user_id` ordered by position.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SkillDetail>, AppError>;

    async fn find_for_user(&self, user_id: Uuid, skill_id: Uuid) -> Result<Option<SkillDetail>, AppError>;

    async fn has_technology(&self, user_id: Uuid, technology_id: Uuid) -> Result<bool, AppError>;

    /// Appends a skill at the end of the owner's list.
    async fn create_skill(&self, skill: &SkillInsert) -> Result<SkillDetail, AppError>;

    /// Updates attributes; never moves the skill.
    async fn update_skill(&self, user_id: Uuid, skill_id: Uuid, changes: &UpdateSkillRequest) -> Result<SkillDetail, AppError>;

    /// Deletes a skill and closes the gap in the owner's positions.
    async fn delete_skill(&self, user_id: Uuid, skill_id: Uuid) -> Result<(), AppError>;

    /// Assigns positions 1..N following `ordered_ids`, which must be exactly
    /// the owner's skill ids.
    async fn reorder_skills(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<Vec<SkillDetail>, AppError>;
}

impl SqlxSkillRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxSkillRepo { pool }
    }

    async fn fetch_detail(conn: &mut PgConnection, skill_id: Uuid) -> Result<SkillDetail, AppError> {
        let sql = format!("{SELECT_SKILL_DETAIL} WHERE s.id = $1");

        sqlx::query_as::<_, SkillDetail>(&sql)
            .bind(skill_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound("Skill not found".into()),
                _ => e.into(),
            })
    }

    async fn fetch_list(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<SkillDetail>, AppError> {
        let sql = format!("{SELECT_SKILL_DETAIL} WHERE s.user_id = $1 ORDER BY s.position ASC");

        let skills = sqlx::query_as::<_, SkillDetail>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(skills)
    }
}

fn map_skill_write_error(err: sqlx::Error) -> AppError {
    match unique_violation(&err) {
        Some(SKILL_TECHNOLOGY_UNIQUE) => {
            AppError::field("technology_id", "This technology is already in your skills")
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl SkillRepository for SqlxSkillRepo {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SkillDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_list(&mut conn, user_id).await
    }

    async fn find_for_user(&self, user_id: Uuid, skill_id: Uuid) -> Result<Option<SkillDetail>, AppError> {
        let sql = format!("{SELECT_SKILL_DETAIL} WHERE s.id = $1 AND s.user_id = $2");

        let skill = sqlx::query_as::<_, SkillDetail>(&sql)
            .bind(skill_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(skill)
    }

    async fn has_technology(&self, user_id: Uuid, technology_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM skills WHERE user_id = $1 AND technology_id = $2)"
        )
        .bind(user_id)
        .bind(technology_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_skill(&self, skill: &SkillInsert) -> Result<SkillDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        SKILLS.lock_owner(&mut tx, skill.user_id).await?;
        let position = next_position(SKILLS.max_position(&mut tx, skill.user_id).await?);

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO skills (user_id, technology_id, level, years_experience, visibility, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#
        )
        .bind(skill.user_id)
        .bind(skill.technology_id)
        .bind(skill.level)
        .bind(skill.years_experience)
        .bind(skill.visibility)
        .bind(position)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_skill_write_error)?;

        let created = Self::fetch_detail(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(skill_id = %id, user_id = %skill.user_id, position, "Skill created");
        Ok(created)
    }

    async fn update_skill(&self, user_id: Uuid, skill_id: Uuid, changes: &UpdateSkillRequest) -> Result<SkillDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE skills SET
                level = COALESCE($3, level),
                years_experience = COALESCE($4, years_experience),
                visibility = COALESCE($5, visibility),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#
        )
        .bind(skill_id)
        .bind(user_id)
        .bind(changes.level)
        .bind(changes.years_experience)
        .bind(changes.visibility)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Skill not found".into()));
        }

        let updated = Self::fetch_detail(&mut tx, skill_id).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_skill(&self, user_id: Uuid, skill_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        SKILLS.lock_owner(&mut tx, user_id).await?;
        let current = SKILLS.owned_ids(&mut tx, user_id).await?;

        if !current.contains(&skill_id) {
            return Err(AppError::NotFound("Skill not found".into()));
        }

        sqlx::query("DELETE FROM skills WHERE id = $1 AND user_id = $2")
            .bind(skill_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        SKILLS.apply(&mut tx, user_id, &plan_removal(&current, &skill_id)).await?;
        tx.commit().await?;

        tracing::info!(%skill_id, %user_id, "Skill deleted");
        Ok(())
    }

    async fn reorder_skills(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<Vec<SkillDetail>, AppError> {
        let mut tx = self.pool.begin().await?;

        SKILLS.lock_owner(&mut tx, user_id).await?;
        let stored = SKILLS.stored(&mut tx, user_id).await?;
        let current: Vec<Uuid> = stored.iter().map(|(id, _)| *id).collect();

        let plan = plan_reorder(&current, ordered_ids)
            .map_err(|mismatch| mismatch.into_app_error("skill_ids"))?;

        if !plan.is_noop(&stored) {
            SKILLS.apply(&mut tx, user_id, &plan).await?;
        }

        let skills = Self::fetch_list(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(%user_id, count = plan.len(), "Skills reordered");
        Ok(skills)
    }
}
