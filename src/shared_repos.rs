use std::sync::Arc;

use crate::repositories::{
    external_profile::ExternalProfileRepository,
    permission::PermissionRepository,
    skill::SkillRepository,
    sqlx_repo::{
        SqlxExternalProfileRepo, SqlxPermissionRepo, SqlxSkillRepo, SqlxTechnologyRepo, SqlxUserRepo,
    },
    technology::TechnologyRepository,
    user::UserRepository,
};

/// Repository set the use cases are built from. Tests swap in their own
/// implementations through the struct fields.
#[derive(Clone)]
pub struct SharedRepositories {
    pub user_repo: Arc<dyn UserRepository>,
    pub technology_repo: Arc<dyn TechnologyRepository>,
    pub skill_repo: Arc<dyn SkillRepository>,
    pub profile_repo: Arc<dyn ExternalProfileRepository>,
    pub permission_repo: Arc<dyn PermissionRepository>,
}

impl SharedRepositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        SharedRepositories {
            user_repo: Arc::new(SqlxUserRepo::new(pool.clone())),
            technology_repo: Arc::new(SqlxTechnologyRepo::new(pool.clone())),
            skill_repo: Arc::new(SqlxSkillRepo::new(pool.clone())),
            profile_repo: Arc::new(SqlxExternalProfileRepo::new(pool.clone())),
            permission_repo: Arc::new(SqlxPermissionRepo::new(pool)),
        }
    }
}
