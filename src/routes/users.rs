use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Name, email and password, trimmed and all present.
pub struct NewUserFields {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUserRequest {
    pub fn validate(self) -> AppResult<NewUserFields> {
        let present = |v: Option<String>, trim: bool| {
            v.map(|s| if trim { s.trim().to_string() } else { s })
                .filter(|s| !s.is_empty())
        };
        match (
            present(self.name, true),
            present(self.email, true),
            present(self.password, false),
        ) {
            (Some(name), Some(email), Some(password)) => Ok(NewUserFields {
                name,
                email,
                password,
            }),
            _ => Err(AppError::BadRequest(
                "Name, email and password are required".into(),
            )),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<NewUserRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let fields = req.validate()?;
    let user = state
        .auth
        .register(&fields.name, &fields.email, &fields.password)
        .map_err(AppError::service("create user"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "user": user })),
    ))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.users.list().map_err(AppError::service("list users"))?;
    Ok(Json(users))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    state
        .users
        .find(id)
        .map_err(AppError::service("find user"))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
