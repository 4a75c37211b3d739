use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    domain::ordering::{next_position, plan_removal, plan_reorder},
    entities::external_profile::{ExternalProfile, ExternalProfileChanges, ExternalProfileInsert, Platform},
    errors::{unique_violation, AppError},
    repositories::{positions::EXTERNAL_PROFILES, sqlx_repo::SqlxExternalProfileRepo},
};

const PROFILE_PLATFORM_UNIQUE: &str = "external_profiles_user_id_platform_key";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalProfileRepository: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExternalProfile>, AppError>;
    async fn find_for_user(&self, user_id: Uuid, profile_id: Uuid) -> Result<Option<ExternalProfile>, AppError>;
    async fn has_platform(&self, user_id: Uuid, platform: Platform) -> Result<bool, AppError>;
    async fn create_profile(&self, profile: &ExternalProfileInsert) -> Result<ExternalProfile, AppError>;
    async fn update_profile(&self, user_id: Uuid, profile_id: Uuid, changes: &ExternalProfileChanges) -> Result<ExternalProfile, AppError>;
    async fn delete_profile(&self, user_id: Uuid, profile_id: Uuid) -> Result<(), AppError>;
    async fn reorder_profiles(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<Vec<ExternalProfile>, AppError>;
}

impl SqlxExternalProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxExternalProfileRepo { pool }
    }

    async fn fetch_list(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<ExternalProfile>, AppError> {
        let profiles = sqlx::query_as::<_, ExternalProfile>(
            "SELECT * FROM external_profiles WHERE user_id = $1 ORDER BY position ASC"
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(profiles)
    }
}

fn map_profile_write_error(err: sqlx::Error) -> AppError {
    match unique_violation(&err) {
        Some(PROFILE_PLATFORM_UNIQUE) => {
            AppError::field("platform", "You already linked a profile on this platform")
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl ExternalProfileRepository for SqlxExternalProfileRepo {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExternalProfile>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_list(&mut conn, user_id).await
    }

    async fn find_for_user(&self, user_id: Uuid, profile_id: Uuid) -> Result<Option<ExternalProfile>, AppError> {
        let profile = sqlx::query_as::<_, ExternalProfile>(
            "SELECT * FROM external_profiles WHERE id = $1 AND user_id = $2"
        )
        .bind(profile_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn has_platform(&self, user_id: Uuid, platform: Platform) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM external_profiles WHERE user_id = $1 AND platform = $2)"
        )
        .bind(user_id)
        .bind(platform)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_profile(&self, profile: &ExternalProfileInsert) -> Result<ExternalProfile, AppError> {
        let mut tx = self.pool.begin().await?;

        EXTERNAL_PROFILES.lock_owner(&mut tx, profile.user_id).await?;
        let position = next_position(EXTERNAL_PROFILES.max_position(&mut tx, profile.user_id).await?);

        let created = sqlx::query_as::<_, ExternalProfile>(
            r#"
            INSERT INTO external_profiles (user_id, platform, handle, url, position)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(profile.user_id)
        .bind(profile.platform)
        .bind(&profile.handle)
        .bind(&profile.url)
        .bind(position)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_profile_write_error)?;

        tx.commit().await?;

        tracing::info!(profile_id = %created.id, user_id = %created.user_id, position, "External profile created");
        Ok(created)
    }

    async fn update_profile(&self, user_id: Uuid, profile_id: Uuid, changes: &ExternalProfileChanges) -> Result<ExternalProfile, AppError> {
        sqlx::query_as::<_, ExternalProfile>(
            r#"
            UPDATE external_profiles SET
                handle = $3,
                url = $4,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#
        )
        .bind(profile_id)
        .bind(user_id)
        .bind(&changes.handle)
        .bind(&changes.url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("External profile not found".into()),
            _ => e.into(),
        })
    }

    async fn delete_profile(&self, user_id: Uuid, profile_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        EXTERNAL_PROFILES.lock_owner(&mut tx, user_id).await?;
        let current = EXTERNAL_PROFILES.owned_ids(&mut tx, user_id).await?;

        if !current.contains(&profile_id) {
            return Err(AppError::NotFound("External profile not found".into()));
        }

        sqlx::query("DELETE FROM external_profiles WHERE id = $1 AND user_id = $2")
            .bind(profile_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        EXTERNAL_PROFILES.apply(&mut tx, user_id, &plan_removal(&current, &profile_id)).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn reorder_profiles(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<Vec<ExternalProfile>, AppError> {
        let mut tx = self.pool.begin().await?;

        EXTERNAL_PROFILES.lock_owner(&mut tx, user_id).await?;
        let stored = EXTERNAL_PROFILES.stored(&mut tx, user_id).await?;
        let current: Vec<Uuid> = stored.iter().map(|(id, _)| *id).collect();

        let plan = plan_reorder(&current, ordered_ids)
            .map_err(|mismatch| mismatch.into_app_error("profile_ids"))?;

        if !plan.is_noop(&stored) {
            EXTERNAL_PROFILES.apply(&mut tx, user_id, &plan).await?;
        }

        let profiles = Self::fetch_list(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(%user_id, count = plan.len(), "External profiles reordered");
        Ok(profiles)
    }
}
