pub mod external_profile;
pub mod skill;
pub mod technology;
pub mod token;
pub mod user;
