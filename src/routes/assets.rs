use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

/// Stylesheet and scripts for the web client, compiled into the binary.
#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

/// Only stylesheets and scripts are public.
fn is_public(path: &str) -> bool {
    path.starts_with("css/") || path.starts_with("js/")
}

/// GET /assets/{*path}
pub async fn serve(Path(path): Path<String>) -> Response {
    let Some(file) = is_public(&path).then(|| Assets::get(&path)).flatten() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let headers = [
        (header::CONTENT_TYPE, mime.to_string()),
        (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
    ];
    (headers, file.data.into_owned()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_css_and_js_are_public() {
        assert!(is_public("css/app.css"));
        assert!(is_public("js/api.js"));
        assert!(!is_public("app.css"));
        assert!(!is_public("../Cargo.toml"));
    }

    #[tokio::test]
    async fn serves_embedded_script_with_mime() {
        let response = serve(Path("js/api.js".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn missing_asset_is_404() {
        let response = serve(Path("css/nope.css".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
