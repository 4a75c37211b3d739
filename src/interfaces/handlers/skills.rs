use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::skill::{NewSkillRequest, ReorderSkillsRequest, UpdateSkillRequest},
    errors::AppError,
    use_cases::extractors::{AuthClaims, OptionalClaims},
    AppState,
};

#[instrument(skip(claims, state))]
pub async fn list_my_skills(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let skills = state.skill_handler.list_own(user_id).await?;
    Ok(HttpResponse::Ok().json(skills))
}

#[instrument(skip(claims, state, data))]
pub async fn create_skill(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<NewSkillRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let skill = state.skill_handler.create_skill(user_id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(skill))
}

#[instrument(skip(claims, state, data))]
pub async fn update_skill(
    claims: AuthClaims,
    skill_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateSkillRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let skill = state.skill_handler.update_skill(user_id, &skill_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(skill))
}

#[instrument(skip(claims, state))]
pub async fn delete_skill(
    claims: AuthClaims,
    skill_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    state.skill_handler.delete_skill(user_id, &skill_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(claims, state, data), fields(count = data.skill_ids.len()))]
pub async fn reorder_skills(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<ReorderSkillsRequest>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;
    let skills = state.skill_handler.reorder_skills(user_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(skills))
}

#[instrument(skip(viewer, state))]
pub async fn list_user_skills(
    username: web::Path<String>,
    viewer: OptionalClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let owner = state.auth_handler.get_user_by_username(&username).await?;
    let skills = state.skill_handler.list_visible(owner.id, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(skills))
}
