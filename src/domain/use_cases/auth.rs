use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::JwtService;
use crate::auth::password::{hash_password, verify_password};
use crate::domain::password::check_password_strength;
use crate::entities::token::AuthResponse;
use crate::entities::user::{LoginUser, NewUser, NewUserResponse, User};
use crate::errors::{AppError, AuthError};
use crate::interfaces::repositories::user::UserRepository;
use crate::use_cases::usernames::UsernameGenerator;

pub struct AuthHandler<R>
where
    R: UserRepository + ?Sized,
{
    pub user_repo: Arc<R>,
    pub token_service: JwtService,
    pub usernames: UsernameGenerator<R>,
}

impl<R> AuthHandler<R>
where
    R: UserRepository + ?Sized,
{
    pub fn new(user_repo: Arc<R>, token_service: JwtService) -> Self {
        AuthHandler {
            usernames: UsernameGenerator::new(Arc::clone(&user_repo)),
            user_repo,
            token_service,
        }
    }

    /// Registers a new user and gives them a username derived from the
    /// display name.
    ///
    /// A username failure does not fail registration; the account is kept
    /// without one and picked up by `usernames:backfill`.
    pub async fn register(&self, request: NewUser) -> Result<NewUserResponse, AppError> {
        request.validate()?;

        check_password_strength(&request.password, &[request.email.as_str(), request.display_name.as_str()])
            .map_err(|e| {
                let message = e.message.map(|m| m.to_string()).unwrap_or_default();
                AppError::field("password", message)
            })?;

        let hashed_password = hash_password(&request.password)?;
        let user = self.user_repo.create_user(&request.prepare_for_insert(hashed_password)).await?;

        let username = match self.usernames.assign(&user).await {
            Ok(named) => named.username,
            Err(e) => {
                tracing::error!(user_id = %user.id, "Username assignment failed: {}", e);
                None
            }
        };

        tracing::info!(user_id = %user.id, "User registered");
        Ok(NewUserResponse {
            id: user.id,
            username,
            message: "User created successfully".to_string(),
        })
    }

    /// Logs in a user by validating credentials and generating JWTs
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate().map_err(|_| AuthError::WrongCredentials)?;

        let email = request.email.trim().to_lowercase();
        let user = self.user_repo.get_user_by_email(&email)
            .await
            .map_err(|_| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::WrongCredentials);
        }

        let response = self.create_auth_response(&user)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(response)
    }

    pub fn create_auth_response(&self, user: &User) -> Result<AuthResponse, AuthError> {
        self.token_service.issue_pair(user).map_err(|e| {
            tracing::warn!("Failed to create JWT: {}", e);
            AuthError::TokenCreation
        })
    }

    /// Issues a fresh pair; the access token picks up a username assigned
    /// since the last login.
    pub async fn refresh_token(&self, token: &str) -> Result<AuthResponse, AuthError> {
        let decoded = self.token_service.decode_refresh_jwt(token)?;
        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AuthError::InvalidUserId)?;

        let user = self.user_repo.get_user_by_id(&user_id)
            .await
            .map_err(|_| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        self.create_auth_response(&user)
    }

    pub async fn get_user(&self, user_id: &Uuid) -> Result<User, AppError> {
        self.user_repo
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, AppError> {
        self.user_repo
            .get_user_by_username(&username.to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user named '{username}'")))
    }
}
