pub mod access;
pub mod auth;
pub mod external_profiles;
pub mod extractors;
pub mod skills;
pub mod technologies;
pub mod usernames;
