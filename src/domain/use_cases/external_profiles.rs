use std::sync::Arc;

use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    entities::external_profile::{
        resolve_link, ExternalProfile, ExternalProfileChanges, ExternalProfileInsert,
        NewExternalProfileRequest, ReorderExternalProfilesRequest, UpdateExternalProfileRequest,
    },
    errors::AppError,
    repositories::external_profile::ExternalProfileRepository,
    utils::valid_uuid::valid_uuid,
};

fn link_error((field, error): (&'static str, ValidationError)) -> AppError {
    let message = error
        .message
        .map(|m| m.to_string())
        .unwrap_or_else(|| "Invalid value".to_string());
    AppError::field(field, message)
}

pub struct ExternalProfileHandler<R>
where
    R: ExternalProfileRepository + ?Sized,
{
    pub profile_repo: Arc<R>,
}

impl<R> ExternalProfileHandler<R>
where
    R: ExternalProfileRepository + ?Sized,
{
    pub fn new(profile_repo: Arc<R>) -> Self {
        ExternalProfileHandler { profile_repo }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ExternalProfile>, AppError> {
        self.profile_repo.list_for_user(user_id).await
    }

    pub async fn create_profile(&self, user_id: Uuid, request: NewExternalProfileRequest) -> Result<ExternalProfile, AppError> {
        request.validate()?;

        let (handle, url) = resolve_link(request.platform, &request.handle, request.url.as_deref())
            .map_err(link_error)?;

        if self.profile_repo.has_platform(user_id, request.platform).await? {
            return Err(AppError::field("platform", "You already linked a profile on this platform"));
        }

        let insert = ExternalProfileInsert {
            user_id,
            platform: request.platform,
            handle,
            url,
        };

        self.profile_repo.create_profile(&insert).await
    }

    /// Changing only the handle re-derives the URL unless one is given.
    pub async fn update_profile(&self, user_id: Uuid, profile_id: &str, request: UpdateExternalProfileRequest) -> Result<ExternalProfile, AppError> {
        request.validate()?;
        let profile_id = valid_uuid(profile_id)?;

        let current = self.profile_repo
            .find_for_user(user_id, profile_id)
            .await?
            .ok_or_else(|| AppError::NotFound("External profile not found".into()))?;

        let raw_handle = request.handle.as_deref().unwrap_or(&current.handle);
        let explicit_url = match (&request.url, &request.handle) {
            (Some(url), _) => Some(url.as_str()),
            // keep a custom URL when the handle is untouched
            (None, None) => Some(current.url.as_str()),
            (None, Some(_)) => None,
        };

        let (handle, url) = resolve_link(current.platform, raw_handle, explicit_url)
            .map_err(link_error)?;

        let changes = ExternalProfileChanges { handle, url };
        if changes.handle == current.handle && changes.url == current.url {
            return Ok(current);
        }

        self.profile_repo.update_profile(user_id, profile_id, &changes).await
    }

    pub async fn delete_profile(&self, user_id: Uuid, profile_id: &str) -> Result<(), AppError> {
        let profile_id = valid_uuid(profile_id)?;
        self.profile_repo.delete_profile(user_id, profile_id).await
    }

    pub async fn reorder_profiles(&self, user_id: Uuid, request: ReorderExternalProfilesRequest) -> Result<Vec<ExternalProfile>, AppError> {
        request.validate()?;
        self.profile_repo.reorder_profiles(user_id, &request.profile_ids).await
    }
}
