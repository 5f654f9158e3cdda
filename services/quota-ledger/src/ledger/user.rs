use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    #[error("no authenticated user")]
    Unauthenticated,
    #[error("invalid user id: {0}")]
    InvalidUserId(String),
}

const MAX_USER_ID_LEN: usize = 128;

/// Checks an identifier handed over by the authentication provider.
///
/// Blank ids mean nobody is signed in; the ledger never substitutes a
/// default user.
pub fn validate_user_id(user_id: &str) -> Result<(), UserValidationError> {
    if user_id.trim().is_empty() {
        return Err(UserValidationError::Unauthenticated);
    }

    if user_id.len() > MAX_USER_ID_LEN {
        return Err(UserValidationError::InvalidUserId(user_id.to_string()));
    }

    if !user_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '@'))
    {
        return Err(UserValidationError::InvalidUserId(user_id.to_string()));
    }

    Ok(())
}
