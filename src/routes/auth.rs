use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{clear_session_cookie, session_cookie};
use crate::error::{AppError, AppResult};
use crate::routes::users::NewUserRequest;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
}

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>,
) -> AppResult<Response> {
    let fields = req.validate()?;
    state
        .auth
        .register(&fields.name, &fields.email, &fields.password)
        .map_err(AppError::service("register user"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "User registered successfully" })),
    )
        .into_response())
}

/// POST /auth/login: token in the body and in an http-only cookie.
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> AppResult<Response> {
    let email = req.email.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let outcome = state
        .auth
        .login(email, password)
        .map_err(AppError::service("log in"))?;

    let max_age = state.auth.keys().lifetime().num_seconds();
    let cookie = session_cookie(&state.config.auth.cookie_name, &outcome.token, max_age);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "message": "Login successful",
            "token": outcome.token,
            "user": outcome.user,
        })),
    )
        .into_response())
}

/// GET /auth/logout: nothing to revoke server-side; drop the cookie.
async fn logout(State(state): State<AppState>) -> Response {
    let success = state.auth.logout();
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            clear_session_cookie(&state.config.auth.cookie_name),
        )],
        Json(json!({ "success": success })),
    )
        .into_response()
}
