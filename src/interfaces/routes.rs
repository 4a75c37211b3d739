use actix_web::web;

use crate::handlers::home::home;

mod admin;
mod auth;
mod external_profiles;
mod json_error;
mod skills;
mod technologies;
mod users;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(auth::config_routes)
            .configure(admin::config_routes)
            .configure(users::config_routes)
            .configure(skills::config_routes)
            .configure(external_profiles::config_routes)
            .configure(technologies::config_routes)
    );

    cfg.configure(json_error::config_routes);
}
