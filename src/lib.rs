//! identa is a minimal user-account service issuing signed bearer tokens.

#![forbid(unsafe_code)]

pub mod config;
mod crypto;
pub mod error;
mod router;
mod token;
mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Method, StatusCode, header};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    state: Option<&AppState>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let token = match state {
        Some(state) => {
            let token = state
                .token
                .issue("admin", "admin@identa.test")
                .expect("cannot create JWT");
            format!("Bearer {token}")
        },
        None => String::default(),
    };

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, token)
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub identity: user::IdentityService,
    pub token: token::TokenIssuer,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http().on_response(
                DefaultOnResponse::new()
                    .include_headers(true)
                    .latency_unit(LatencyUnit::Micros),
            ),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        .nest("/api/users", router::router(state.clone()))
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read();

    let store = match config.postgres {
        Some(ref postgres) => {
            user::PostgresUserStore::connect(
                &postgres.address,
                &postgres
                    .username
                    .clone()
                    .unwrap_or(user::DEFAULT_CREDENTIALS.into()),
                &postgres
                    .password
                    .clone()
                    .unwrap_or(user::DEFAULT_CREDENTIALS.into()),
                &postgres
                    .database
                    .clone()
                    .unwrap_or(user::DEFAULT_DATABASE_NAME.into()),
                postgres.pool_size.unwrap_or(user::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        None => {
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(store.pool()).await?;

    // handle jwt.
    let Some(jwt) = &config.jwt else {
        tracing::warn!("missing `jwt` entry on `config.yaml` file");
        std::process::exit(0);
    };
    let token = token::TokenIssuer::new(jwt);

    let identity =
        user::IdentityService::new(Arc::new(store), token.clone());

    Ok(AppState {
        config,
        identity,
        token,
    })
}
