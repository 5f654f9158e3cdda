use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use tracing::debug;

use crate::ledger::validate_user_id;

use super::types::ErrorResponse;

/// Header the authentication gateway sets to the signed-in user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's user id, taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity(pub String);

impl UserIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .trim()
            .to_string();

        match validate_user_id(&user_id) {
            Ok(()) => Ok(UserIdentity(user_id)),
            Err(err) => {
                debug!(error = %err, "rejecting request without a usable user id");
                Err(super::handlers::user_rejection(&err))
            }
        }
    }
}
