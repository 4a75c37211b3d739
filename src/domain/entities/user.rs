use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use validator::Validate;
use uuid::Uuid;

const MAX_DISPLAY_NAME_LENGTH: u64 = 80;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub display_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UserInsert {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = MAX_DISPLAY_NAME_LENGTH, message = "Display name must be between 1 and 80 characters"))]
    pub display_name: String,

    #[validate(length(min = 8, message = "Must be at least 8 characters"))]
    pub password: String,
}

impl NewUser {
    pub fn prepare_for_insert(&self, password_hash: String) -> UserInsert {
        UserInsert {
            email: self.email.trim().to_lowercase(),
            display_name: self.display_name.trim().to_string(),
            password_hash,
            is_admin: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewUserResponse {
    pub id: Uuid,
    pub username: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UsernameSuggestionQuery {
    #[validate(length(min = 1, max = MAX_DISPLAY_NAME_LENGTH, message = "Display name must be between 1 and 80 characters"))]
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameSuggestionResponse {
    pub username: String,
}
