use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    web, HttpResponse, ResponseError,
};
use serde_json::json;

/// Uniform JSON bodies for payloads actix rejects before a handler runs.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        PayloadError::from(err).into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        PayloadError::from(err).into()
    }));
}

#[derive(Debug)]
pub struct PayloadError {
    message: String,
    status: StatusCode,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<JsonPayloadError> for PayloadError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match &err {
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };

        PayloadError {
            message: format!("JSON payload error: {}", err),
            status,
        }
    }
}

impl From<QueryPayloadError> for PayloadError {
    fn from(err: QueryPayloadError) -> Self {
        PayloadError {
            message: format!("Query string error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}
