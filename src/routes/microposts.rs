use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::{Category, MicroPost};
use crate::error::{AppError, AppResult};
use crate::services::NewMicropost;
use crate::state::AppState;
use crate::uploads::is_allowed_image;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/microposts", get(list_microposts).post(create_micropost))
        .route("/microposts/{id}", get(get_micropost))
        .route("/microposts/{id}/categories", get(micropost_categories))
}

/// Uploaded image held in memory until the post is validated.
struct ImageUpload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct MicropostForm {
    user_id: Option<String>,
    title: Option<String>,
    image: Option<ImageUpload>,
    category_ids: Vec<String>,
}

impl MicropostForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = MicropostForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "userId" => form.user_id = Some(field.text().await?),
                "title" => form.title = Some(field.text().await?),
                "categoryIds" | "categoryIds[]" => form.category_ids.push(field.text().await?),
                "image" => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was picked
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }

        Ok(form)
    }
}

/// Accepts repeated fields as well as comma-separated lists.
fn parse_category_ids(raw: &[String]) -> AppResult<Vec<i64>> {
    raw.iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("Invalid category id {:?}", value)))
        })
        .collect()
}

fn parse_user_id(raw: Option<&str>) -> AppResult<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("User is required".into()))?;
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid user id {:?}", raw)))
}

/// POST /microposts (multipart: userId, title, image?, categoryIds[])
async fn create_micropost(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MicroPost>)> {
    let form = MicropostForm::read(multipart).await?;

    let title = form.title.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    let user_id = parse_user_id(form.user_id.as_deref())?;
    let category_ids = parse_category_ids(&form.category_ids)?;

    if let Some(image) = &form.image {
        if !image.file_name.as_deref().is_some_and(is_allowed_image) {
            return Err(AppError::BadRequest(
                "Image must be a PNG, JPEG, GIF or WebP file".into(),
            ));
        }
    }

    let image_path = match &form.image {
        Some(image) => Some(
            state
                .images
                .save(image.file_name.as_deref(), &image.bytes)
                .await?,
        ),
        None => None,
    };

    let result = state.microposts.create(NewMicropost {
        user_id,
        title,
        image_path: image_path.clone(),
        category_ids,
    });

    match result {
        Ok(post) => Ok((StatusCode::CREATED, Json(post))),
        Err(e) => {
            if let Some(path) = image_path {
                state.images.remove(&path).await;
            }
            Err(AppError::service("create micropost")(e))
        }
    }
}

/// GET /microposts
async fn list_microposts(State(state): State<AppState>) -> AppResult<Json<Vec<MicroPost>>> {
    let posts = state
        .microposts
        .list()
        .map_err(AppError::service("list microposts"))?;
    Ok(Json(posts))
}

/// GET /microposts/{id}
async fn get_micropost(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MicroPost>> {
    state
        .microposts
        .find_by_id(id)
        .map_err(AppError::service("find micropost"))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Micropost not found".into()))
}

/// GET /microposts/{id}/categories
async fn micropost_categories(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state
        .microposts
        .categories_for_micropost(id)
        .map_err(AppError::service("fetch micropost categories"))?;
    Ok(Json(categories))
}
