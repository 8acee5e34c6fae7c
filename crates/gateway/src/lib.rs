//! HTTP API gateway for Switchboard.
//!
//! Two endpoints: `POST /chat` runs one conversational turn, `GET /health`
//! reports liveness. The chat route sits behind optional bearer auth and a
//! sliding-window rate limit; health is exempt from both so monitoring can
//! poll it freely.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use switchboard_config::AppConfig;
use switchboard_core::error::Error;
use switchboard_core::turn::{TurnRequest, TurnResponse};
use switchboard_router::TurnRouter;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared application state, built once in [`start`] and passed explicitly.
pub struct AppState {
    pub router: Arc<TurnRouter>,
    /// Bearer token required on `/chat`; `None` leaves the gateway open.
    pub auth_token: Option<String>,
    pub rate_limit_per_minute: usize,
}

/// Build the Axum router. Public so tests can drive it with
/// `tower::ServiceExt::oneshot`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let limiter = Arc::new(RateLimiter::new(
        state.rate_limit_per_minute,
        Duration::from_secs(60),
    ));

    let protected = Router::new()
        .route("/chat", post(chat_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(middleware::from_fn(move |req, next| {
            let limiter = limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server: assemble the full turn-routing stack from
/// config, bind, and serve until shutdown.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = Arc::new(TurnRouter::from_config(&config).await?);
    let state = Arc::new(AppState {
        auth_token: config.gateway.auth_token.clone(),
        rate_limit_per_minute: config.gateway.rate_limit_per_minute,
        router,
    });
    let app = build_router(state);

    info!(addr = %addr, "Gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.router.model_name().to_string(),
    })
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, (StatusCode, Json<ErrorBody>)> {
    if payload.user_id.trim().is_empty() {
        return Err(error_body(
            StatusCode::BAD_REQUEST,
            "user_id must not be empty",
        ));
    }

    match state
        .router
        .handle_turn(&payload.user_id, &payload.message)
        .await
    {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            error!(user_id = %payload.user_id, error = %err, "Turn failed");
            let status = match err {
                // upstream trouble is not our fault
                Error::Llm(_) | Error::Tool(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err(error_body(status, err.to_string()))
        }
    }
}

// --- Middleware ---

/// Bearer auth on the chat route. No configured token means the gateway is
/// open; with one, a missing or malformed header is 401 and a wrong token
/// is 403.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    let Some(expected) = state.auth_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        None => {
            warn!("Rejected request without a bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
        Some(token) if token != expected => {
            warn!("Rejected request with an invalid bearer token");
            Err(StatusCode::FORBIDDEN)
        }
        Some(_) => Ok(next.run(req).await),
    }
}

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key. Thread-safe via
/// `std::sync::Mutex` (non-async, held briefly); lock poisoning is absorbed.
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Whether the client is within its budget. Records the request if so.
    fn check(&self, client_key: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Keep the map from growing without bound under many distinct keys
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push(now);
        true
    }
}

/// Rate limiting keyed by the Authorization header, falling back to
/// "anonymous". `/health` is exempt so monitoring and benchmarks can poll it.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if req.uri().path() == "/health" {
        return Ok(next.run(req).await);
    }

    let client_key = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key.chars().take(20).collect::<String>(), "Rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(req).await)
}
