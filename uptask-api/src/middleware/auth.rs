/// Session verification layer
///
/// Runs before every protected handler: verifies the bearer token, loads
/// the user it names and inserts an [`AuthUser`] into the request
/// extensions. Handlers read it with `Extension<AuthUser>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uptask_shared::auth::middleware::{authenticate_bearer, AuthUser};

use crate::{app::AppState, error::ApiError};

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user: AuthUser = authenticate_bearer(&state.db, state.jwt_secret(), auth_header).await?;

    tracing::debug!(user_id = %user.id, "Session verified");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
