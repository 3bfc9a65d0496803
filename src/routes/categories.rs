use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{Category, PostSummary};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::services::ServiceError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewCategoryRequest {
    pub title: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{name}/microposts", get(category_microposts))
}

/// POST /categories (admins only)
async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<NewCategoryRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if !user.is_admin {
        return Err(AppError::service("create category")(ServiceError::Forbidden));
    }

    let title = req.title.unwrap_or_default();
    let category = state
        .categories
        .create(&title)
        .map_err(AppError::service("create category"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Category created successfully", "category": category })),
    ))
}

/// GET /categories
async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = state
        .categories
        .list()
        .map_err(AppError::service("list categories"))?;
    Ok(Json(categories))
}

/// GET /categories/{name}/microposts (name matched case-insensitively)
async fn category_microposts(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<PostSummary>>> {
    let category = state
        .categories
        .find_by_name(&name)
        .map_err(AppError::service("find category"))?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    let posts = state
        .micropost_categories
        .posts_for(category.id)
        .map_err(AppError::service("list category microposts"))?;
    Ok(Json(posts))
}
