use actix_web::web;

use crate::handlers::skills;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/skills")
            .service(
                web::resource("")
                    .route(web::get().to(skills::list_my_skills))
                    .route(web::post().to(skills::create_skill))
            )
            // before "/{skill_id}" so "reorder" is never taken for an id
            .service(
                web::resource("/reorder")
                    .route(web::post().to(skills::reorder_skills))
            )
            .service(
                web::resource("/{skill_id}")
                    .route(web::patch().to(skills::update_skill))
                    .route(web::delete().to(skills::delete_skill))
            )
    );
}
