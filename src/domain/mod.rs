pub mod access_control;
pub mod entities;
pub mod ordering;
pub mod password;
pub mod use_cases;
pub mod username;
