use axum::{Json, extract::State};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::LoginRequest;

/// Handler to log a user in.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<LoginRequest>,
) -> Result<Json<String>> {
    let token = state.identity.login(body).await?;

    Ok(Json(token))
}
