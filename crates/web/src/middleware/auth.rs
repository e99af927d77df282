//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring user authentication in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::{Flash, push_flash};
use crate::models::{CurrentUser, session_keys};

/// Flash shown when an anonymous visitor hits a protected page.
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be logged in.";

/// Extractor that requires user authentication.
///
/// If the user is not logged in, HTML requests are redirected to the login
/// page with a flash and API requests get a bare 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        match user {
            Some(user) => Ok(Self(user)),
            None if is_api => Err(AuthRejection::Unauthorized),
            None => {
                if let Err(e) = push_flash(session, Flash::error(LOGIN_REQUIRED_MESSAGE)).await {
                    tracing::warn!(error = %e, "Failed to queue login flash");
                }
                Err(AuthRejection::RedirectToLogin)
            }
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session (login).
///
/// The session id is cycled first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tastemap_core::{Email, UserId};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::middleware::flash::take_flashes;

    fn parts_with_session(path: &str, session: &Session) -> Parts {
        let (mut parts, ()) = Request::builder().uri(path).body(()).unwrap().into_parts();
        parts.extensions.insert(session.clone());
        parts
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: Email::parse("wes@example.com").unwrap(),
            name: "Wes".to_string(),
        }
    }

    #[tokio::test]
    async fn test_require_auth_redirects_html_with_flash() {
        let session = session();
        let mut parts = parts_with_session("/add", &session);

        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");

        let flashes = take_flashes(&session).await.unwrap();
        assert_eq!(flashes, vec![Flash::error(LOGIN_REQUIRED_MESSAGE)]);
    }

    #[tokio::test]
    async fn test_require_auth_rejects_api_with_401() {
        let session = session();
        let mut parts = parts_with_session("/api/stores/1/heart", &session);

        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
        assert!(take_flashes(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logged_in_user_is_extracted() {
        let session = session();
        set_current_user(&session, &user()).await.unwrap();
        let mut parts = parts_with_session("/add", &session);

        let RequireAuth(current) = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(current.id, UserId::new(7));

        clear_current_user(&session).await.unwrap();
        let OptionalAuth(current) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(current.is_none());
    }
}
