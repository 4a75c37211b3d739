use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{entities::token::Claims, errors::AuthError, AppState};

const API_PREFIX: &str = "/api/v1";

/// Verifies bearer tokens and stores the decoded [`Claims`] in the request
/// extensions.
///
/// Public routes pass without a token; a valid token sent to one is still
/// decoded so handlers can tell members from anonymous visitors.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let public = is_public_route(req.path(), req.method().as_str());

            let claims = match get_valid_claims(&req) {
                Ok(claims) => Some(claims),
                Err(_) if public => None,
                Err(e) => {
                    match e {
                        AuthError::MissingJwtService => tracing::error!("AppState missing in middleware"),
                        AuthError::MissingCredentials => {
                            tracing::warn!(path = %req.path(), "Missing or malformed Authorization header")
                        }
                        _ => tracing::warn!(path = %req.path(), "Rejected token: {}", e),
                    }
                    return Ok(req.into_response(e.error_response()));
                }
            };

            if let Some(claims) = claims {
                if let Err(e) = enforce_admin_access(req.path(), &claims) {
                    return Ok(req.into_response(e.error_response()));
                }
                req.extensions_mut().insert(claims);
            }

            service.call(req).await
        })
    }
}

fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return true;
    }

    if path == "/" {
        return method == "GET";
    }

    let Some(route) = path.strip_prefix(API_PREFIX) else {
        return false;
    };
    let segments: Vec<&str> = route.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("POST", ["auth", "register" | "login" | "refresh"]) => true,
        ("GET", ["technologies"]) | ("GET", ["technologies", "search"]) => true,
        ("GET", ["users", "username-suggestion"]) => true,
        ("GET", ["users", _, "skills" | "external-profiles"]) => true,
        _ => false,
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        })
}

fn get_valid_claims(req: &ServiceRequest) -> Result<Claims, AuthError> {
    let token = extract_token(req).ok_or(AuthError::MissingCredentials)?;

    let state = req.app_data::<web::Data<AppState>>()
        .ok_or(AuthError::MissingJwtService)?;

    let decoded = state.auth_handler.token_service.decode_jwt(&token)?;
    Ok(decoded.claims)
}

fn enforce_admin_access(path: &str, claims: &Claims) -> Result<(), AuthError> {
    let under_admin = path
        .strip_prefix(API_PREFIX)
        .is_some_and(|route| route == "/admin" || route.starts_with("/admin/"));

    if under_admin && !claims.admin {
        tracing::warn!(path, sub = %claims.sub, "Admin access required");
        return Err(AuthError::Forbidden("Admin access required".into()));
    }
    Ok(())
}
