use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path segment as a UUID, rejecting anything else as bad input.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("'{id}' is not a valid id")))
}
