pub mod external_profile;
pub mod permission;
pub mod positions;
pub mod skill;
pub mod sqlx_repo;
pub mod technology;
pub mod user;
