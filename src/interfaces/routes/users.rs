use actix_web::web;

use crate::handlers::{external_profiles, skills, users};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(
                web::resource("/me")
                    .route(web::get().to(users::me))
            )
            .service(
                web::resource("/username-suggestion")
                    .route(web::get().to(users::suggest_username))
            )
            .service(
                web::resource("/{username}/skills")
                    .route(web::get().to(skills::list_user_skills))
            )
            .service(
                web::resource("/{username}/external-profiles")
                    .route(web::get().to(external_profiles::list_user_profiles))
            )
    );
}
