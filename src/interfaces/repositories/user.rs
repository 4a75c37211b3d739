use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::user::{User, UserInsert},
    errors::{unique_violation, AppError},
    repositories::sqlx_repo::SqlxUserRepo,
};

const USERS_EMAIL_UNIQUE: &str = "users_email_key";
const USERS_USERNAME_UNIQUE: &str = "users_username_key";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn count_users(&self) -> Result<u64, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn create_user(&self, user: &UserInsert) -> Result<User, AppError>;
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    /// Usernames starting with `stem` and ending in `-<digits>`.
    async fn numbered_usernames(&self, stem: &str) -> Result<Vec<String>, AppError>;

    /// Stores `username` for a user that has none yet.
    ///
    /// Fails with `Conflict` when another user holds the name (the unique
    /// index decides) and `InvalidInput` when the user already has one.
    async fn claim_username(&self, user_id: &Uuid, username: &str) -> Result<User, AppError>;

    /// Users still waiting for a username, oldest first.
    async fn users_without_username(&self, limit: i64) -> Result<Vec<User>, AppError>;
}

impl SqlxUserRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxUserRepo { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn count_users(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn create_user(&self, user: &UserInsert) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, display_name, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#
        )
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(USERS_EMAIL_UNIQUE) => {
                AppError::Conflict("User with this email already exists".to_string())
            }
            _ => AppError::from(e),
        })
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn numbered_usernames(&self, stem: &str) -> Result<Vec<String>, AppError> {
        // stems are [a-z0-9-], so nothing in them needs LIKE escaping
        let usernames: Vec<String> = sqlx::query_scalar(
            "SELECT username FROM users WHERE username LIKE $1 || '%' AND username ~ '-[0-9]+$'"
        )
        .bind(stem)
        .fetch_all(&self.pool)
        .await?;

        Ok(usernames)
    }

    async fn claim_username(&self, user_id: &Uuid, username: &str) -> Result<User, AppError> {
        let claimed = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, updated_at = NOW()
            WHERE id = $1 AND username IS NULL
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(USERS_USERNAME_UNIQUE) => {
                AppError::Conflict(format!("Username '{username}' is taken"))
            }
            _ => AppError::from(e),
        })?;

        match claimed {
            Some(user) => Ok(user),
            None => match self.get_user_by_id(user_id).await? {
                Some(_) => Err(AppError::InvalidInput("User already has a username".to_string())),
                None => Err(AppError::NotFound("User not found".to_string())),
            },
        }
    }

    async fn users_without_username(&self, limit: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username IS NULL ORDER BY created_at ASC LIMIT $1"
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
