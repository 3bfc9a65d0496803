use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::ServiceError;
use crate::state::AppState;

/// The user identified by a valid session token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
}

/// Extractor that requires authentication.
/// Accepts `Authorization: Bearer <token>` or the session cookie; 401 otherwise.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)
            .or_else(|| extract_cookie(parts, &state.config.auth.cookie_name))
            .ok_or_else(|| AppError::service("authenticate")(ServiceError::Unauthorized))?;

        let claims = state
            .auth
            .verify(token)
            .map_err(AppError::service("authenticate"))?;

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
        })
    }
}

/// Optional user extractor: `None` instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}

fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn extract_cookie<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(name.clone(), *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_is_extracted() {
        let parts = parts_with(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let parts = parts_with(&[(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")]);
        assert_eq!(extract_bearer_token(&parts), None);
    }

    #[test]
    fn cookie_is_found_among_others() {
        let parts = parts_with(&[(
            header::COOKIE,
            "theme=dark; microblog_session=tok123; lang=en",
        )]);
        assert_eq!(extract_cookie(&parts, "microblog_session"), Some("tok123"));
        assert_eq!(extract_cookie(&parts, "missing"), None);
    }

    #[test]
    fn cleared_cookie_counts_as_absent() {
        let parts = parts_with(&[(header::COOKIE, "microblog_session=")]);
        assert_eq!(extract_cookie(&parts, "microblog_session"), None);
    }
}
