use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};
use uuid::Uuid;

use crate::entities::token::{AuthResponse, Claims, RefreshClaims};
use crate::entities::user::User;
use crate::errors::AuthError;
use crate::settings::{AppConfig, JwtKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

/// Issues and verifies access and refresh tokens. The two token kinds are
/// signed with different secrets so one can never stand in for the other.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_expiration: Duration,
    refresh_expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            access_expiration: Duration::minutes(config.jwt_expiration_minutes),
            refresh_expiration: Duration::days(config.refresh_token_exp_days),
        }
    }

    pub fn create_jwt(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.access_expiration).timestamp() as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            admin: user.is_admin,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(AuthError::from)
    }

    pub fn create_refresh_jwt(&self, user_id: &Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.refresh_expiration).timestamp() as usize;

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.refresh_encoding).map_err(AuthError::from)
    }

    /// Access and refresh token pair for `user`.
    pub fn issue_pair(&self, user: &User) -> Result<AuthResponse, AuthError> {
        Ok(AuthResponse::bearer(
            self.create_jwt(user)?,
            self.create_refresh_jwt(&user.id)?,
            self.access_expiration.num_seconds(),
        ))
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }

    pub fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<RefreshClaims>(token, &self.keys.refresh_decoding, &validation).map_err(AuthError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            username: Some("ada-lovelace".into()),
            display_name: "Ada Lovelace".into(),
            password_hash: String::new(),
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let service = JwtService::new(&AppConfig::testing());
        let user = user();

        let token = service.create_jwt(&user).unwrap();
        let claims = service.decode_jwt(&token).unwrap().claims;

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username.as_deref(), Some("ada-lovelace"));
        assert!(!claims.admin);
    }

    #[test]
    fn pair_reports_access_lifetime() {
        let config = AppConfig::testing();
        let pair = JwtService::new(&config).issue_pair(&user()).unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, config.jwt_expiration_minutes * 60);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let service = JwtService::new(&AppConfig::testing());
        let refresh = service.create_refresh_jwt(&Uuid::new_v4()).unwrap();

        assert!(service.decode_jwt(&refresh).is_err());
        assert!(service.decode_refresh_jwt(&refresh).is_ok());
    }
}
