//! Per-page layout data.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::flash::{Flash, take_flashes};
use crate::models::{CurrentUser, session_keys};

/// What every page layout needs: the logged-in user and pending flashes.
///
/// Extracting this drains the session's flash queue, so only handlers that
/// render HTML should ask for it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Whether the visitor is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Read the user and drain flashes from `session`.
    ///
    /// For handlers that may redirect instead of rendering.
    pub async fn load(session: &Session) -> Self {
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        let flashes = take_flashes(session).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flashes");
            Vec::new()
        });

        Self { user, flashes }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        Ok(Self::load(session).await)
    }
}
