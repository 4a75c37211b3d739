use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::external_profile::{
        NewExternalProfileRequest, ReorderExternalProfilesRequest, UpdateExternalProfileRequest,
    },
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

#[instrument(skip(claims, state))]
pub async fn list_my_profiles(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let profiles = state.profile_handler.list_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

#[instrument(skip(claims, state, data))]
pub async fn create_profile(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<NewExternalProfileRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let profile = state.profile_handler.create_profile(user_id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

#[instrument(skip(claims, state, data))]
pub async fn update_profile(
    claims: AuthClaims,
    profile_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateExternalProfileRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let profile = state.profile_handler.update_profile(user_id, &profile_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[instrument(skip(claims, state))]
pub async fn delete_profile(
    claims: AuthClaims,
    profile_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    state.profile_handler.delete_profile(user_id, &profile_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(claims, state, data), fields(count = data.profile_ids.len()))]
pub async fn reorder_profiles(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<ReorderExternalProfilesRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let profiles = state.profile_handler.reorder_profiles(user_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

/// Profiles are public links; every visitor sees the full list.
#[instrument(skip(state))]
pub async fn list_user_profiles(
    username: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let owner = state.auth_handler.get_user_by_username(&username).await?;
    let profiles = state.profile_handler.list_for_user(owner.id).await?;
    Ok(HttpResponse::Ok().json(profiles))
}
