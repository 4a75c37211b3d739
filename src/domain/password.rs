use std::borrow::Cow;

use validator::ValidationError;
use zxcvbn::zxcvbn;

const MIN_LENGTH: usize = 8;
const MIN_STRENGTH_SCORE: u8 = 3;

/// Rejects short or guessable passwords.
///
/// `user_inputs` are account details (email, display name) that zxcvbn
/// penalizes when they appear inside the password.
pub fn check_password_strength(password: &str, user_inputs: &[&str]) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_LENGTH {
        return Err(weak_password(
            "password_length",
            format!("Must be at least {} characters", MIN_LENGTH),
        ));
    }

    let estimate = zxcvbn(password, user_inputs);

    if (estimate.score() as u8) < MIN_STRENGTH_SCORE {
        let feedback = estimate.feedback()
            .and_then(|f| f.warning().map(|w| w.to_string()))
            .unwrap_or_else(|| "Password is too easy to guess".to_string());

        return Err(weak_password("password_strength", feedback));
    }

    Ok(())
}

fn weak_password(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}
