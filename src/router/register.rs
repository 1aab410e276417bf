use axum::{Json, extract::State};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::RegisterRequest;

/// Handler to register a user.
///
/// Returns the bearer token of the freshly logged-in account.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<RegisterRequest>,
) -> Result<Json<String>> {
    let token = state.identity.register(body).await?;

    Ok(Json(token))
}
