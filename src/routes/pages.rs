use askama::Template;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDateTime, Utc};

use crate::db::models::{Category, MicroPost};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Signed-in user as the page header shows them.
pub struct Viewer {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
}

pub struct PostView {
    pub id: i64,
    pub title: String,
    pub image_path: Option<String>,
    pub author: String,
    pub created_at: String,
    pub time_ago: String,
    pub categories: Vec<Category>,
}

impl From<MicroPost> for PostView {
    fn from(post: MicroPost) -> Self {
        let time_ago = parse_and_format_time(&post.created_at);
        PostView {
            id: post.id,
            title: post.title,
            image_path: post.image_path,
            author: post.user.name,
            created_at: post.created_at,
            time_ago,
            categories: post.categories,
        }
    }
}

/// Category navigation entry; `active` marks the category being viewed.
pub struct NavLink {
    pub id: i64,
    pub title: String,
    pub active: bool,
}

fn nav_links(categories: Vec<Category>, active: Option<&str>) -> Vec<NavLink> {
    categories
        .into_iter()
        .map(|category| NavLink {
            active: active.is_some_and(|name| name.eq_ignore_ascii_case(&category.title)),
            id: category.id,
            title: category.title,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "pages/feed.html")]
pub struct FeedTemplate {
    pub viewer: Option<Viewer>,
    pub nav: Vec<NavLink>,
    pub heading: String,
    pub posts: Vec<PostView>,
    pub user_count: i64,
}

/// GET /
pub async fn index(State(state): State<AppState>, maybe_user: MaybeUser) -> AppResult<Response> {
    let posts = state
        .microposts
        .list()
        .map_err(AppError::service("list microposts"))?;
    render_feed(&state, maybe_user, None, posts)
}

/// GET /category/{name}
pub async fn category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    maybe_user: MaybeUser,
) -> AppResult<Response> {
    let category = state
        .categories
        .find_by_name(&name)
        .map_err(AppError::service("find category"))?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

    let posts = state
        .microposts
        .list_in_category(category.id)
        .map_err(AppError::service("list category microposts"))?;
    render_feed(&state, maybe_user, Some(category.title), posts)
}

fn render_feed(
    state: &AppState,
    maybe_user: MaybeUser,
    active_category: Option<String>,
    posts: Vec<MicroPost>,
) -> AppResult<Response> {
    let viewer = match maybe_user.0 {
        // A token can outlive its user; render that visitor as signed out.
        Some(current) => state
            .users
            .find(current.id)
            .map_err(AppError::service("load user"))?
            .map(|user| Viewer {
                id: user.id,
                name: user.name,
                is_admin: user.is_admin,
            }),
        None => None,
    };

    let categories = state
        .categories
        .list()
        .map_err(AppError::service("list categories"))?;
    let user_count = state.users.count().map_err(AppError::service("count users"))?;

    let heading = match &active_category {
        Some(title) => format!("Posts in {}", title),
        None => "Latest posts".to_string(),
    };

    Ok(Html(FeedTemplate {
        viewer,
        nav: nav_links(categories, active_category.as_deref()),
        heading,
        posts: posts.into_iter().map(PostView::from).collect(),
        user_count,
    })
    .into_response())
}

fn parse_and_format_time(db_time: &str) -> String {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|_| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let diff = Utc::now().naive_utc().signed_duration_since(*dt);

    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }
    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PostAuthor;
    use chrono::NaiveDate;

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now().naive_utc();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::minutes(5))),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::hours(3))),
            "3h ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::days(2))),
            "2d ago"
        );
    }

    #[test]
    fn old_posts_show_the_date() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(format_relative_time(&dt), "Jan 15, 2025");
        assert_eq!(parse_and_format_time("2025-01-15 12:00:00"), "Jan 15, 2025");
    }

    #[test]
    fn unparseable_timestamp_is_shown_raw() {
        assert_eq!(parse_and_format_time("not-a-date"), "not-a-date");
    }

    #[test]
    fn nav_marks_active_category_case_insensitively() {
        let categories = vec![
            Category {
                id: 1,
                title: "Rust".into(),
            },
            Category {
                id: 2,
                title: "Go".into(),
            },
        ];
        let nav = nav_links(categories, Some("rust"));
        assert!(nav[0].active);
        assert!(!nav[1].active);
    }

    #[test]
    fn category_links_encode_slashes() {
        let cpp = Category {
            id: 4,
            title: "C/C++".into(),
        };
        let post = MicroPost {
            id: 1,
            title: "Templates".into(),
            image_path: None,
            created_at: "2025-01-15 12:00:00".into(),
            user: PostAuthor {
                id: 1,
                name: "Alice".into(),
            },
            categories: vec![cpp.clone()],
        };
        let html = FeedTemplate {
            viewer: None,
            nav: nav_links(vec![cpp], None),
            heading: "Latest posts".into(),
            posts: vec![post.into()],
            user_count: 1,
        }
        .render()
        .unwrap();

        assert_eq!(html.matches("href=\"/category/C%2FC%2B%2B\"").count(), 2);
        assert!(!html.contains("href=\"/category/C/"));
    }

    #[test]
    fn feed_renders_posts_and_escapes_titles() {
        let post = MicroPost {
            id: 1,
            title: "<b>Hello</b>".into(),
            image_path: Some("/uploads/abc.png".into()),
            created_at: "2025-01-15 12:00:00".into(),
            user: PostAuthor {
                id: 1,
                name: "Alice".into(),
            },
            categories: vec![Category {
                id: 2,
                title: "Rust".into(),
            }],
        };
        let html = FeedTemplate {
            viewer: None,
            nav: nav_links(
                vec![Category {
                    id: 2,
                    title: "Rust".into(),
                }],
                None,
            ),
            heading: "Latest posts".into(),
            posts: vec![post.into()],
            user_count: 1,
        }
        .render()
        .unwrap();

        assert!(html.contains("&lt;b&gt;Hello"));
        assert!(!html.contains("<b>Hello"));
        assert!(html.contains("abc.png"));
        assert!(html.contains("/category/Rust"));
        assert!(html.contains("login-modal"));
        assert!(!html.contains("post-modal"));
    }

    #[test]
    fn signed_in_feed_offers_new_post() {
        let html = FeedTemplate {
            viewer: Some(Viewer {
                id: 3,
                name: "Bob".into(),
                is_admin: false,
            }),
            nav: vec![],
            heading: "Posts in Rust".into(),
            posts: vec![],
            user_count: 1,
        }
        .render()
        .unwrap();

        assert!(html.contains("post-modal"));
        assert!(html.contains("data-user-id=\"3\""));
        assert!(!html.contains("category-form"));
    }
}
