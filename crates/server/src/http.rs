//! HTTP JSON API.
//!
//! Every route that touches the stores or scores candidates runs its work
//! on a blocking thread. Authenticated routes expect an
//! `Authorization: Bearer <token>` header carrying a token from
//! `/api/login`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, Query, State, rejection::JsonRejection},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{net::TcpListener, task};
use tower_http::trace::TraceLayer;
use tracing::info;

use storage::{FeedbackValue, Role};

use crate::admin::{AdminService, DashboardMetrics, FeedbackLogEntry, UserSummary};
use crate::auth::{AuthError, AuthService};
use crate::orchestrator::{Recommendation, RecommendationOrchestrator};
use crate::session::{Session, SessionRegistry};

/// Listening address and request defaults
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Number of recommendations when the request does not name a limit
    pub default_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            default_limit: 8,
        }
    }
}

/// Everything the handlers share
pub struct AppState {
    pub orchestrator: RecommendationOrchestrator,
    pub auth: AuthService,
    pub admin: AdminService,
    pub sessions: SessionRegistry,
    pub default_limit: usize,
}

type SharedState = Arc<AppState>;

/// Bind and serve until Ctrl-C
pub async fn serve(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(Arc::new(state));
    let addr = SocketAddr::from((config.host, config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, default_limit = config.default_limit, "smart-recs listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/signup", post(signup_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/reset-password", post(reset_password_handler))
        .route("/api/recommendations", get(recommendations_handler))
        .route("/api/feedback", post(feedback_handler))
        .route("/api/admin/metrics", get(metrics_handler))
        .route("/api/admin/users", get(users_handler))
        .route("/api/admin/users/:username/role", post(toggle_role_handler))
        .route("/api/admin/feedback", get(feedback_log_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let model = state.orchestrator.model();
    Json(HealthResponse {
        status: "ok",
        items: model.item_count(),
        users_in_model: model.user_count(),
    })
}

async fn signup_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let user = blocking(move || Ok(state.auth.signup(&payload.username, &payload.password)?)).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            username: user.username,
            role: user.role,
        }),
    ))
}

async fn login_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = blocking(move || {
        let user = state.auth.login(&payload.username, &payload.password)?;
        let token = state.sessions.login(&user);
        Ok(LoginResponse {
            token,
            username: user.username,
            role: user.role,
        })
    })
    .await?;
    Ok(Json(response))
}

async fn logout_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    if !state.sessions.logout(token) {
        return Err(ApiError::Unauthorized);
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_password_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    blocking(move || Ok(state.auth.reset_password(&payload.username, &payload.new_password)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recommendations_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let session = require_session(&state, &headers)?;
    let limit = params.limit.unwrap_or(state.default_limit);
    let user = session.username;
    let response = blocking(move || {
        let items = state.orchestrator.get_recommendations(&user, limit)?;
        Ok(RecommendationsResponse { user, items })
    })
    .await?;
    Ok(Json(response))
}

async fn feedback_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ApiError> {
    let session = require_session(&state, &headers)?;
    let value = parse_action(&payload.action)?;
    if payload.item.trim().is_empty() {
        return Err(ApiError::BadRequest("item must not be empty".to_string()));
    }
    let user = session.username;
    let response = blocking(move || {
        state.orchestrator.record_feedback(&user, &payload.item, value)?;
        Ok(FeedbackResponse {
            user,
            item: payload.item,
            action: value.label(),
        })
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn metrics_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<DashboardMetrics>, ApiError> {
    require_admin(&state, &headers)?;
    let metrics = blocking(move || Ok(state.admin.metrics()?)).await?;
    Ok(Json(metrics))
}

async fn users_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    require_admin(&state, &headers)?;
    let users = blocking(move || Ok(state.admin.users()?)).await?;
    Ok(Json(users))
}

async fn toggle_role_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let response = blocking(move || {
        let role = state.admin.toggle_role(&username)?;
        state.sessions.set_role(&username, role);
        Ok(AccountResponse { username, role })
    })
    .await?;
    Ok(Json(response))
}

async fn feedback_log_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FeedbackLogEntry>>, ApiError> {
    require_admin(&state, &headers)?;
    let log = blocking(move || Ok(state.admin.feedback_log()?)).await?;
    Ok(Json(log))
}

// =============================================================================
// Helpers
// =============================================================================

async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work).await?
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    bearer_token(headers)
        .and_then(|token| state.sessions.get(token))
        .ok_or(ApiError::Unauthorized)
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let session = require_session(state, headers)?;
    if session.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(session)
}

fn parse_action(action: &str) -> Result<FeedbackValue, ApiError> {
    match action.to_ascii_lowercase().as_str() {
        "like" => Ok(FeedbackValue::Like),
        "dislike" => Ok(FeedbackValue::Dislike),
        other => Err(ApiError::BadRequest(format!(
            "action must be \"like\" or \"dislike\", got {:?}",
            other
        ))),
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}

/// JSON request body whose rejections are reported like every other error
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct JsonBody<T>(T);

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("missing or unknown session token")]
    Unauthorized,
    #[error("admin role required")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
    #[error("internal task failure: {0}")]
    Join(#[from] task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::InvalidCredentials) | ApiError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::UsernameTaken(_)) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Auth(AuthError::EmptyField(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(err = %self, "request failed");
        }
        let body = Json(ErrorPayload {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Serialize)]
struct ErrorPayload {
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    items: usize,
    users_in_model: usize,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    username: String,
    new_password: String,
}

#[derive(Debug, Serialize)]
struct AccountResponse {
    username: String,
    role: Role,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    username: String,
    role: Role,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct RecommendationsResponse {
    user: String,
    items: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    item: String,
    action: String,
}

#[derive(Debug, Serialize)]
struct FeedbackResponse {
    user: String,
    item: String,
    action: &'static str,
}
