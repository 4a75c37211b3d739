mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod graceful_shutdown;
pub mod shared_repos;
pub mod telemetry;

pub use domain::{access_control, entities, ordering, password, use_cases, username};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, utils};

use auth::jwt::JwtService;
use repositories::{
    external_profile::ExternalProfileRepository,
    permission::PermissionRepository,
    skill::SkillRepository,
    technology::TechnologyRepository,
    user::UserRepository,
};
use shared_repos::SharedRepositories;
use use_cases::{
    access::AccessControlHandler,
    auth::AuthHandler,
    external_profiles::ExternalProfileHandler,
    skills::SkillHandler,
    technologies::TechnologyHandler,
};

pub type AppAuthHandler = AuthHandler<dyn UserRepository>;
pub type AppSkillHandler = SkillHandler<dyn SkillRepository, dyn TechnologyRepository>;
pub type AppProfileHandler = ExternalProfileHandler<dyn ExternalProfileRepository>;
pub type AppTechnologyHandler = TechnologyHandler<dyn TechnologyRepository>;
pub type AppAccessHandler = AccessControlHandler<dyn PermissionRepository>;

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub skill_handler: AppSkillHandler,
    pub profile_handler: AppProfileHandler,
    pub technology_handler: AppTechnologyHandler,
    pub access_handler: AppAccessHandler,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        Self::with_repositories(config, SharedRepositories::postgres(pool))
    }

    pub fn with_repositories(config: &settings::AppConfig, repos: SharedRepositories) -> Self {
        AppState {
            auth_handler: AuthHandler::new(repos.user_repo, JwtService::new(config)),
            skill_handler: SkillHandler::new(repos.skill_repo, repos.technology_repo.clone()),
            profile_handler: ExternalProfileHandler::new(repos.profile_repo),
            technology_handler: TechnologyHandler::new(repos.technology_repo),
            access_handler: AccessControlHandler::new(repos.permission_repo),
        }
    }
}
