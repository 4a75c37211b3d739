use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use derive_more::Display;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use serde::Serialize;
use serde_json::json;
use validator::ValidationErrors;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Display)]
pub enum AppError {
    #[display("Validation failed: {}", FieldError::summary(_0))]
    ValidationError(Vec<FieldError>),

    #[display("Invalid input: {_0}")]
    InvalidInput(String),

    #[display("Not found: {_0}")]
    NotFound(String),

    #[display("Conflict: {_0}")]
    Conflict(String),

    #[display("Unauthorized access")]
    UnauthorizedAccess,

    #[display("Forbidden access")]
    ForbiddenAccess,

    #[display("Internal server error: {_0}")]
    InternalError(String),
}

impl std::error::Error for AppError {}

impl AppError {
    /// Single field-level validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::UnauthorizedAccess => "unauthorized",
            AppError::ForbiddenAccess => "forbidden",
            AppError::InternalError(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => json!({
                "error": "Validation failed",
                "code": self.code(),
                "details": errors,
            }),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": "Internal server error", "code": self.code() })
            }
            _ => json!({ "error": self.to_string(), "code": self.code() }),
        };

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenAccess => StatusCode::FORBIDDEN,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e.message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        // field_errors() is backed by a HashMap
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationError(field_errors)
    }
}

/// Constraint violations repositories translate into domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbViolation<'a> {
    Unique(&'a str),
    ForeignKey(&'a str),
}

impl<'a> DbViolation<'a> {
    /// Classifies `err`; the payload is the constraint name, empty when unknown.
    pub fn of(err: &'a sqlx::Error) -> Option<Self> {
        let sqlx::Error::Database(db_err) = err else {
            return None;
        };
        let constraint = db_err.constraint().unwrap_or_default();

        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => Some(DbViolation::Unique(constraint)),
            Some(FOREIGN_KEY_VIOLATION) => Some(DbViolation::ForeignKey(constraint)),
            _ => None,
        }
    }
}

/// Violated constraint name when `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match DbViolation::of(err) {
        Some(DbViolation::Unique(constraint)) => Some(constraint),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match DbViolation::of(&err) {
            Some(DbViolation::Unique(constraint)) => {
                AppError::Conflict(format!("Duplicate value violates {constraint}"))
            }
            Some(DbViolation::ForeignKey(_)) => AppError::NotFound("Referenced record not found".into()),
            None => match err {
                sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
                _ => AppError::InternalError(format!("Database error: {}", err)),
            },
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(_) => AppError::ForbiddenAccess,
            AuthError::TokenCreation | AuthError::MissingJwtService => AppError::InternalError(err.to_string()),
            _ => AppError::UnauthorizedAccess,
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

#[derive(Debug, Display)]
pub enum AuthError {
    #[display("Invalid token")]
    InvalidToken,

    #[display("Wrong credentials")]
    WrongCredentials,

    #[display("Token creation error")]
    TokenCreation,

    #[display("Token expired")]
    TokenExpired,

    #[display("Missing credentials")]
    MissingCredentials,

    #[display("Missing JWT service")]
    MissingJwtService,

    #[display("Invalid user ID")]
    InvalidUserId,

    #[display("Forbidden: {_0}")]
    Forbidden(String),
}

impl std::error::Error for AuthError {}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let error_message = match self {
            AuthError::TokenExpired => "Token has expired".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .json(json!({ "error": error_message }))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::InvalidToken
            | AuthError::WrongCredentials
            | AuthError::TokenExpired
            | AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenCreation | AuthError::MissingJwtService => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidUserId => StatusCode::BAD_REQUEST,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        tracing::warn!("Password check failed: {}", err);
        AuthError::WrongCredentials
    }
}

#[derive(Debug, Display)]
pub enum PasswordError {
    #[display("Invalid password parameters: {_0}")]
    InvalidParameters(String),

    #[display("Password hashing failed: {_0}")]
    HashingError(String),

    #[display("Invalid password hash format: {_0}")]
    InvalidHashFormat(String),

    #[display("Password verification failed: {_0}")]
    VerificationError(String),
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn summary(errors: &[FieldError]) -> String {
        errors.iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
