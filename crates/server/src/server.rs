use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use api_types::health::Health;
use engine::Engine;

use crate::{auth, categories, statistics, transactions};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: auth::TokenConfig,
}

/// Resolves the bearer token to a user and stores it as a request extension.
///
/// Missing, malformed or expired tokens are 401; a valid token for a
/// deactivated account is 403. Handlers behind this layer never see an
/// unauthenticated request.
async fn require_user(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = state
        .tokens
        .decode(bearer.token())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let user_id: i32 = claims.sub.parse().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = state
        .engine
        .user_by_id(user_id)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    if !user.is_active {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn health(State(state): State<ServerState>) -> Json<Health> {
    let database = match state.engine.ping().await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::error!("database ping failed: {err}");
            "unavailable"
        }
    };

    Json(Health {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}

fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::remove),
        )
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/transactions/recent", get(transactions::recent))
        .route("/transactions/stats", get(statistics::stats))
        .route("/transactions/by-category", get(statistics::by_category))
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::remove),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Builds the full application router. Exposed so tests and embedders can
/// drive the service without a listener.
pub fn app(engine: Engine, tokens: auth::TokenConfig) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
        tokens,
    })
}

pub async fn run(engine: Engine, tokens: auth::TokenConfig) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, tokens, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    tokens: auth::TokenConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine, tokens)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    tokens: auth::TokenConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, tokens, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
