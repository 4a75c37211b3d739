use argon2::{
    password_hash::{
        rand_core::OsRng,
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, Error as Argon2Error
    },
    Argon2, Algorithm, Params, Version
};

use crate::errors::PasswordError;

/// Argon2id with parameters tuned for interactive logins.
fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(15_000, 2, 1, None)
        .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingError(e.to_string()))
        .map(|hash| hash.to_string())
}

/// `Ok(false)` for a wrong password, `Err` only when the stored hash is unusable.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hashed)
        .map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(Argon2Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationError(e.to_string())),
    }
}
