use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    access_control::Permission,
    entities::technology::{NewTechnologyRequest, TechnologyListQuery, TechnologySearchQuery},
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

#[instrument(skip(state))]
pub async fn search_technologies(
    state: web::Data<AppState>,
    query: web::Query<TechnologySearchQuery>,
) -> Result<impl Responder, AppError> {
    let response = state.technology_handler.search(&query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(state))]
pub async fn list_technologies(
    state: web::Data<AppState>,
    query: web::Query<TechnologyListQuery>,
) -> Result<impl Responder, AppError> {
    let technologies = state.technology_handler.list(&query).await?;
    Ok(HttpResponse::Ok().json(technologies))
}

#[instrument(skip(claims, state, data))]
pub async fn create_technology(
    claims: AuthClaims,
    state: web::Data<AppState>,
    data: web::Json<NewTechnologyRequest>,
) -> Result<impl Responder, AppError> {
    state.access_handler.authorize(&claims.0, Permission::ManageTechnologies).await?;

    let technology = state.technology_handler.create(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(technology))
}
