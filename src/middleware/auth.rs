use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, AuthError};
use crate::database::models::UserId;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Rejects the request with 401 unless it carries a valid bearer token.
///
/// Runs before any handler, so an unauthenticated request never reaches the store.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = authenticate(&state, &request).map_err(|err| {
        tracing::warn!(
            "Rejected {} {}: {:?}",
            request.method(),
            request.uri().path(),
            err
        );
        ApiError::from(err)
    })?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, request: &Request) -> Result<UserId, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedCredential))
        .transpose()?;
    auth::verify(state.verifier.as_ref(), header)
}
