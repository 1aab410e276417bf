//! HTTP wiring for the four account operations.

pub mod login;
pub mod register;
pub mod users;

use axum::extract::{FromRequest, Request};
use axum::routing::post;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::AppState;
use crate::error::ServerError;

/// Routes mounted under `/api/users`.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `POST /api/users/register` goes to `register`.
        .route("/register", post(register::handler))
        // `POST /api/users/login` goes to `login`.
        .route("/login", post(login::handler))
        // `GET /api/users` and `GET /api/users/{username}`.
        // Authorization required.
        .merge(users::router(state))
}

/// JSON extractor running [`validator`] checks before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;

        Ok(Valid(value))
    }
}

#[cfg(test)]
pub(crate) fn state() -> AppState {
    use std::sync::Arc;

    use crate::config::{Configuration, Jwt};
    use crate::token::TokenIssuer;
    use crate::user::memory::MemoryUserStore;
    use crate::user::IdentityService;

    let jwt = Jwt {
        secret: "an-unguessable-test-secret".into(),
        valid_issuer: "identa.test".into(),
        valid_audience: "identa.test.audience".into(),
    };
    let token = TokenIssuer::new(&jwt);
    let mut config = Configuration::default();
    config.name = "identa".into();
    config.jwt = Some(jwt);

    AppState {
        config: Arc::new(config),
        identity: IdentityService::new(
            Arc::new(MemoryUserStore::default()),
            token.clone(),
        ),
        token,
    }
}
