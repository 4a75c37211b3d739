pub mod auth;
pub mod external_profiles;
pub mod home;
pub mod skills;
pub mod system;
pub mod technologies;
pub mod users;
