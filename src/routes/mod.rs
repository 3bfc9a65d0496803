pub mod assets;
pub mod auth;
pub mod categories;
pub mod microposts;
pub mod pages;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::uploads::UPLOADS_URL_PREFIX;

/// The whole application: JSON API, web client pages, assets and uploaded images.
pub fn app(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(pages::index))
        .route("/category/{name}", get(pages::category))
        .route("/assets/{*path}", get(assets::serve))
        .merge(users::router())
        .merge(auth::router())
        .merge(categories::router())
        .merge(microposts::router())
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(state.images.dir()))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes()))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&state.config.server.cors_origins) {
        app = app.layer(cors);
    }

    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
            .allow_credentials(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_disabled_without_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["not a header\nvalue".to_string()]).is_none());
    }

    #[test]
    fn cors_enabled_with_origins() {
        assert!(cors_layer(&["http://localhost:5173".to_string()]).is_some());
    }
}
