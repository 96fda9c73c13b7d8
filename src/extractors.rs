use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::api_keys::{self, ACCESS_TOKEN_HEADER};
use crate::db::models::User;
use crate::error::AppError;
use crate::state::AppState;

/// The user the request's access token belongs to.
///
/// Handlers receive this as an argument; there is no ambient "current user".
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

/// Extractor that requires authentication.
/// Returns 401 if the `Access-Token` header is missing or unknown.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(parts).ok_or(AppError::Unauthorized)?;

        let conn = state.db.get()?;
        let user = api_keys::resolve(&conn, token)?.ok_or(AppError::Unauthorized)?;
        tracing::debug!(user_id = user.id, "Authenticated request");
        Ok(CurrentUser(user))
    }
}

fn extract_access_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
