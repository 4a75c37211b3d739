use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use tracing::instrument;
use validator::Validate;

use crate::{
    entities::user::{PublicUser, UsernameSuggestionQuery, UsernameSuggestionResponse},
    errors::AppError,
    use_cases::extractors::AuthClaims,
    AppState,
};

#[derive(Debug, Serialize)]
struct CurrentUserResponse {
    #[serde(flatten)]
    user: PublicUser,
    roles: Vec<String>,
}

#[instrument(skip(claims, state))]
pub async fn me(
    claims: AuthClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user_id = claims.user_id()?;

    let user = state.auth_handler.get_user(&user_id).await?;
    let roles = state.access_handler.roles_for_user(user_id).await?;

    Ok(HttpResponse::Ok().json(CurrentUserResponse {
        user: PublicUser::from(user),
        roles,
    }))
}

/// Preview of the username a display name would get. Nothing is reserved.
#[instrument(skip(state))]
pub async fn suggest_username(
    state: web::Data<AppState>,
    query: web::Query<UsernameSuggestionQuery>,
) -> Result<impl Responder, AppError> {
    query.validate()?;

    let username = state.auth_handler.usernames.suggest(&query.display_name).await?;
    Ok(HttpResponse::Ok().json(UsernameSuggestionResponse { username }))
}
