//! Authenticated read endpoints.

use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router, middleware};

use crate::error::{Result, ServerError};
use crate::user::UserView;
use crate::AppState;

const BEARER: &str = "Bearer ";

/// Custom middleware for authentification.
///
/// Only the token itself is checked; handlers never learn which account
/// presented it.
async fn auth(
    State(state): State<AppState>,
    req: Request,
    next: middleware::Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ServerError::Unauthorized)?;
    let token = token.replace(BEARER, "");

    state
        .token
        .decode(&token)
        .map_err(|_| ServerError::Unauthorized)?;

    Ok(next.run(req).await)
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{username}", get(get_user))
        .route_layer(middleware::from_fn_with_state(state, auth))
}

/// Handler to list every user.
async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserView>>> {
    let users = state.identity.list_users().await?;

    Ok(Json(users))
}

/// Handler to fetch one user by username.
async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserView>> {
    let user = state.identity.get_user(&username).await?;

    Ok(Json(user))
}
