use actix_web::web;

use crate::handlers::technologies;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/technologies")
            .service(
                web::resource("")
                    .route(web::get().to(technologies::list_technologies))
                    .route(web::post().to(technologies::create_technology))
            )
            .service(
                web::resource("/search")
                    .route(web::get().to(technologies::search_technologies))
            )
    );
}
