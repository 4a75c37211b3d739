use actix_web::{FromRequest, HttpRequest, HttpMessage};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::{entities::token::Claims, errors::AuthError};

/// Claims of an authenticated caller; 401 otherwise.
///
/// Usage: add `claims: AuthClaims` as a parameter to a handler.
#[derive(Debug)]
pub struct AuthClaims(pub Claims);

impl AuthClaims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        self.0.user_id()
    }
}

impl FromRequest for AuthClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthClaims(claims.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}

/// Claims when a valid token was sent on a public route, `None` otherwise.
#[derive(Debug)]
pub struct OptionalClaims(pub Option<Claims>);

impl OptionalClaims {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().and_then(|claims| claims.user_id().ok())
    }
}

impl FromRequest for OptionalClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(OptionalClaims(req.extensions().get::<Claims>().cloned())))
    }
}

/// Extractor for admin claims: 403 for other users, 401 when unauthenticated.
#[derive(Debug)]
pub struct AdminClaims(pub Claims);

impl FromRequest for AdminClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) if claims.admin => {
                ready(Ok(AdminClaims(claims.clone())))
            }
            Some(_) => {
                ready(Err(AuthError::Forbidden("Admin access required".into()).into()))
            }
            None => {
                ready(Err(AuthError::MissingCredentials.into()))
            }
        }
    }
}
