use actix_web::web;

use crate::handlers::external_profiles;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/external-profiles")
            .service(
                web::resource("")
                    .route(web::get().to(external_profiles::list_my_profiles))
                    .route(web::post().to(external_profiles::create_profile))
            )
            .service(
                web::resource("/reorder")
                    .route(web::post().to(external_profiles::reorder_profiles))
            )
            .service(
                web::resource("/{profile_id}")
                    .route(web::patch().to(external_profiles::update_profile))
                    .route(web::delete().to(external_profiles::delete_profile))
            )
    );
}
